//! Defines the endpoint for creating a new transaction from the dashboard form.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    timezone::get_local_offset,
    transaction::{NewTransaction, RawAmount, Transaction, TransactionKind, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Check user input for a new transaction.
///
/// The transaction is dated now, or at the current local time of day on
/// `date` if one is given.
///
/// # Errors
/// Returns:
/// - [Error::EmptyDescription] if `description` is blank,
/// - [Error::InvalidAmount] or [Error::NegativeAmount] for a bad `amount`,
/// - [Error::FutureDate] if `date` is after today in `local_offset`.
pub fn validate_new_transaction(
    user_id: UserID,
    description: &str,
    amount: &RawAmount,
    kind: TransactionKind,
    date: Option<Date>,
    local_offset: UtcOffset,
) -> Result<NewTransaction, Error> {
    let description = description.trim();

    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    let amount = amount.validate()?;
    let now = OffsetDateTime::now_utc().to_offset(local_offset);

    let created_at = match date {
        Some(date) if date > now.date() => return Err(Error::FutureDate(date)),
        Some(date) => now.replace_date(date),
        None => now,
    };

    Ok(Transaction::build(user_id, description, amount, kind).created_at(created_at))
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub description: String,
    /// The value of the transaction in dollars, as typed.
    pub amount: String,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// When the transaction occurred, defaults to today.
    pub date: Option<Date>,
    /// The start of the calendar range shown on the dashboard.
    pub from: Option<Date>,
    /// The end of the calendar range shown on the dashboard.
    pub to: Option<Date>,
}

/// The dashboard URL that keeps the calendar range the user was looking at.
pub(crate) fn dashboard_url(from: Option<Date>, to: Option<Date>) -> String {
    let mut query = Vec::new();

    if let Some(from) = from {
        query.push(("from", from.to_string()));
    }

    if let Some(to) = to {
        query.push(("to", to.to_string()));
    }

    if query.is_empty() {
        return endpoints::DASHBOARD_VIEW.to_owned();
    }

    match serde_urlencoded::to_string(&query) {
        Ok(query) => format!("{}?{}", endpoints::DASHBOARD_VIEW, query),
        Err(error) => {
            tracing::warn!("Could not encode dashboard range {query:?}: {error}");
            endpoints::DASHBOARD_VIEW.to_owned()
        }
    }
}

/// A route handler for creating a new transaction, redirects to the dashboard on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let new_transaction = match validate_new_transaction(
        user_id,
        &form.description,
        &RawAmount::Text(form.amount),
        form.kind,
        form.date,
        local_offset,
    ) {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::debug!("Rejected new transaction: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(new_transaction, &connection) {
        Ok(transaction) => {
            tracing::info!(
                "User {user_id} recorded {} transaction {}",
                transaction.kind,
                transaction.id
            );
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(dashboard_url(form.from, form.to)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
