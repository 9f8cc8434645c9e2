//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rust_decimal::Decimal;
use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID, transaction::RawAmount};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of a transaction.
pub type TransactionId = i64;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The name used in forms, JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction type {other:?}").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    #[serde(skip)]
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, never negative.
    pub amount: RawAmount,
    /// Whether the money was spent or earned.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction that happened just now.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        user_id: UserID,
        description: &str,
        amount: Decimal,
        kind: TransactionKind,
    ) -> NewTransaction {
        NewTransaction {
            user_id,
            description: description.to_owned(),
            amount,
            kind,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A transaction that has been validated but not yet stored.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// The user recording the transaction.
    pub user_id: UserID,
    /// What the transaction was for.
    pub description: String,
    /// The amount of money, zero or more.
    pub amount: Decimal,
    /// Whether the money was spent or earned.
    pub kind: TransactionKind,
    /// When the transaction happened. Defaults to now.
    pub created_at: OffsetDateTime,
}

impl NewTransaction {
    /// Set when the transaction happened.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = created_at;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, description, amount, type, created_at FROM \"transaction\"";

/// Store a new transaction.
///
/// Timestamps are stored in UTC so that they sort correctly as text.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. `user_id` does not refer to a registered user.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, description, amount, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, description, amount, type, created_at",
        )?
        .query_row(
            (
                transaction.user_id.as_i64(),
                transaction.description,
                RawAmount::from(transaction.amount),
                transaction.kind,
                transaction.created_at.to_offset(UtcOffset::UTC),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction with `id` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all transactions of `user_id`, oldest first.
///
/// Transactions with the same timestamp are returned in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the dashboard, which lists one user's transactions in time order.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created
        ON \"transaction\"(user_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let kind = row.get(4)?;
    let created_at = row.get(5)?;

    Ok(Transaction {
        id,
        user_id,
        description,
        amount,
        kind,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::{PasswordHash, UserID, create_user, parse_email},
        db::initialize,
        transaction::{
            RawAmount, Transaction, TransactionKind, create_transaction, get_transaction,
            get_transactions_for_user,
        },
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            &parse_email("test@example.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let created_at = datetime!(2024-01-01 09:30 +13);

        let transaction = create_transaction(
            Transaction::build(user_id, "Coffee", dec("3.50"), TransactionKind::Expense)
                .created_at(created_at),
            &conn,
        )
        .unwrap();

        assert!(transaction.id > 0);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.description, "Coffee");
        assert_eq!(transaction.amount, RawAmount::Text("3.50".to_owned()));
        assert_eq!(transaction.kind, TransactionKind::Expense);
        assert_eq!(transaction.created_at, created_at);
    }

    #[test]
    fn create_fails_for_unknown_user() {
        let (conn, _) = get_test_connection();

        let result = create_transaction(
            Transaction::build(UserID::new(999), "Coffee", dec("1"), TransactionKind::Expense),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_transaction_is_scoped_to_user() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            &parse_email("other@example.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let transaction = create_transaction(
            Transaction::build(user_id, "Salary", dec("100"), TransactionKind::Income),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_transaction(transaction.id, other_user.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn transactions_are_listed_oldest_first() {
        let (conn, user_id) = get_test_connection();
        let later = create_transaction(
            Transaction::build(user_id, "Later", dec("2"), TransactionKind::Expense)
                .created_at(datetime!(2024-02-01 12:00 UTC)),
            &conn,
        )
        .unwrap();
        let earlier = create_transaction(
            Transaction::build(user_id, "Earlier", dec("1"), TransactionKind::Expense)
                .created_at(datetime!(2024-01-01 12:00 UTC)),
            &conn,
        )
        .unwrap();
        let same_time = create_transaction(
            Transaction::build(user_id, "Same time", dec("3"), TransactionKind::Income)
                .created_at(datetime!(2024-02-01 12:00 UTC)),
            &conn,
        )
        .unwrap();

        let transactions = get_transactions_for_user(user_id, &conn).unwrap();

        assert_eq!(transactions, vec![earlier, later, same_time]);
    }

    #[test]
    fn stored_malformed_amount_is_read_back_as_text() {
        let (conn, user_id) = get_test_connection();
        conn.execute(
            "INSERT INTO \"transaction\" (user_id, description, amount, type, created_at)
            VALUES (?1, 'Broken', 'abc', 'expense', ?2)",
            (user_id.as_i64(), datetime!(2024-01-01 00:00 UTC)),
        )
        .unwrap();

        let transactions = get_transactions_for_user(user_id, &conn).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, RawAmount::Text("abc".to_owned()));
    }

    #[test]
    fn deleting_user_deletes_transactions() {
        let (conn, user_id) = get_test_connection();
        create_transaction(
            Transaction::build(user_id, "Coffee", dec("1"), TransactionKind::Expense),
            &conn,
        )
        .unwrap();

        conn.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])
            .unwrap();

        assert_eq!(get_transactions_for_user(user_id, &conn), Ok(vec![]));
    }

    #[test]
    fn serialises_with_type_field() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(user_id, "Coffee", dec("3.50"), TransactionKind::Expense)
                .created_at(datetime!(2024-01-01 09:30 UTC)),
            &conn,
        )
        .unwrap();

        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": transaction.id,
                "description": "Coffee",
                "amount": "3.50",
                "type": "expense",
                "created_at": "2024-01-01T09:30:00Z",
            })
        );
    }
}
