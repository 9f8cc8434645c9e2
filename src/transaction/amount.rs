//! Transaction amounts as they are entered by users and read back from the database.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, transaction::TransactionId};

/// An amount of money that has not been checked yet.
///
/// Amounts are stored as text, so a value read from the database may not be a
/// number. [RawAmount::to_decimal] is the single place where stored amounts are
/// parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAmount {
    /// An amount that is already known to be a number.
    Decimal(Decimal),
    /// An amount as text, e.g. "3.50".
    Text(String),
}

impl RawAmount {
    /// Parse the amount of the transaction with ID `id`.
    ///
    /// # Errors
    /// Returns [Error::MalformedAmount] if the text is not a decimal number.
    pub fn to_decimal(&self, id: TransactionId) -> Result<Decimal, Error> {
        match self {
            RawAmount::Decimal(amount) => Ok(*amount),
            RawAmount::Text(text) => {
                Decimal::from_str(text.trim()).map_err(|_| Error::MalformedAmount {
                    id,
                    amount: text.clone(),
                })
            }
        }
    }

    /// Check an amount entered by a user.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidAmount] if the amount is not a decimal number,
    /// - [Error::NegativeAmount] if the amount is below zero.
    pub fn validate(&self) -> Result<Decimal, Error> {
        let amount = match self {
            RawAmount::Decimal(amount) => *amount,
            RawAmount::Text(text) => Decimal::from_str(text.trim())
                .map_err(|_| Error::InvalidAmount(text.clone()))?,
        };

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::NegativeAmount(amount.to_string()));
        }

        Ok(amount)
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl Display for RawAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAmount::Decimal(amount) => amount.fmt(f),
            RawAmount::Text(text) => f.write_str(text),
        }
    }
}

impl ToSql for RawAmount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            RawAmount::Decimal(amount) => Ok(ToSqlOutput::from(amount.to_string())),
            RawAmount::Text(text) => Ok(ToSqlOutput::from(text.as_str())),
        }
    }
}

impl FromSql for RawAmount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(amount) => Ok(RawAmount::Decimal(Decimal::from(amount))),
            ValueRef::Real(amount) => Ok(Decimal::try_from(amount)
                .map(RawAmount::Decimal)
                .unwrap_or_else(|_| RawAmount::Text(amount.to_string()))),
            ValueRef::Text(text) => Ok(RawAmount::Text(String::from_utf8_lossy(text).into_owned())),
            ValueRef::Null => Ok(RawAmount::Text(String::new())),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

impl Serialize for RawAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// JSON clients may send amounts either as numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = match AmountInput::deserialize(deserializer)? {
            AmountInput::Number(number) => {
                let text = number.to_string();
                Decimal::from_str(&text)
                    .map(RawAmount::Decimal)
                    .unwrap_or(RawAmount::Text(text))
            }
            AmountInput::Text(text) => RawAmount::Text(text),
        };

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rusqlite::Connection;

    use crate::Error;

    use super::RawAmount;

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn numeric_text_parses() {
        let amount = RawAmount::Text("3.50".to_owned());

        assert_eq!(amount.to_decimal(1), Ok(dec("3.50")));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let amount = RawAmount::Text(" 4 ".to_owned());

        assert_eq!(amount.to_decimal(1), Ok(dec("4")));
    }

    #[test]
    fn non_numeric_text_is_malformed() {
        let amount = RawAmount::Text("abc".to_owned());

        assert_eq!(
            amount.to_decimal(7),
            Err(Error::MalformedAmount {
                id: 7,
                amount: "abc".to_owned()
            })
        );
    }

    #[test]
    fn nan_is_malformed() {
        assert!(matches!(
            RawAmount::Text("NaN".to_owned()).to_decimal(1),
            Err(Error::MalformedAmount { .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_amounts() {
        assert_eq!(
            RawAmount::Text("-1.25".to_owned()).validate(),
            Err(Error::NegativeAmount("-1.25".to_owned()))
        );
    }

    #[test]
    fn validate_rejects_text() {
        assert_eq!(
            RawAmount::Text("twelve".to_owned()).validate(),
            Err(Error::InvalidAmount("twelve".to_owned()))
        );
    }

    #[test]
    fn validate_accepts_zero() {
        assert_eq!(RawAmount::Text("0".to_owned()).validate(), Ok(Decimal::ZERO));
    }

    #[test]
    fn deserialises_numbers_and_strings() {
        let amounts: Vec<RawAmount> = serde_json::from_str(r#"[4, 3.5, "2.25"]"#).unwrap();

        assert_eq!(
            amounts,
            vec![
                RawAmount::Decimal(dec("4")),
                RawAmount::Decimal(dec("3.5")),
                RawAmount::Text("2.25".to_owned()),
            ]
        );
    }

    #[test]
    fn serialises_as_string() {
        let json = serde_json::to_string(&RawAmount::Decimal(dec("7.50"))).unwrap();

        assert_eq!(json, r#""7.50""#);
    }

    #[test]
    fn reads_any_sqlite_value() {
        let connection = Connection::open_in_memory().unwrap();

        let values: (RawAmount, RawAmount, RawAmount) = connection
            .query_row("SELECT 4, 'abc', '12.30'", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();

        assert_eq!(values.0, RawAmount::Decimal(dec("4")));
        assert_eq!(values.1, RawAmount::Text("abc".to_owned()));
        assert_eq!(values.2.to_decimal(1), Ok(dec("12.30")));
    }
}
