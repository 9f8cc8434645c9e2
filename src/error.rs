//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::Date;

use crate::{
    alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError,
    transaction::TransactionId,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot discover which emails are registered.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The auth cookie could not be written or read back.
    #[error("could not process the auth cookie: {0}")]
    CookieError(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is not syntactically valid.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// Another user has already registered with the email address.
    #[error("Email already in use")]
    DuplicateEmail,

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The amount entered for a new transaction is not a number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The amount entered for a new transaction is below zero.
    ///
    /// Whether money was earned or spent is recorded by the transaction type,
    /// so stored amounts are never negative.
    #[error("{0} is negative, amounts must be zero or more")]
    NegativeAmount(String),

    /// The description for a new transaction is empty after trimming whitespace.
    #[error("transaction description cannot be empty")]
    EmptyDescription,

    /// A stored transaction amount could not be parsed as a decimal number.
    ///
    /// This is a data integrity error, distinct from having no data.
    #[error("the amount \"{amount}\" of transaction {id} is not a number")]
    MalformedAmount {
        /// The ID of the offending transaction.
        id: TransactionId,
        /// The raw amount as it was stored.
        amount: String,
    },

    /// Adding up transaction amounts gave a total too large to represent.
    #[error("the {total} is too large to add up")]
    AmountOverflow {
        /// What was being added up, e.g. "total of the group \"Coffee\"".
        total: String,
    },

    /// The start of a date range is later than its end.
    #[error("the start date {from} is later than the end date {to}")]
    InvalidRange {
        /// The requested start date.
        from: Date,
        /// The requested end date.
        to: Date,
    },

    /// The date range covers more days than the calendar will show.
    #[error("the range {from} to {to} is longer than {maximum_days} days")]
    RangeTooLong {
        /// The requested start date.
        from: Date,
        /// The last day of the range, after applying the minimum window.
        to: Date,
        /// The most days the calendar shows.
        maximum_days: i64,
    },

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The calendar window settings contradict each other.
    #[error(
        "the calendar must show at least 1 day and its minimum of {minimum_days} days cannot \
        exceed its maximum of {maximum_days} days"
    )]
    InvalidCalendarConfig { minimum_days: i64, maximum_days: i64 },

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::MalformedAmount { id, amount } => {
                tracing::error!("transaction {id} has the malformed amount {amount:?}");
                InternalServerError {
                    description: "Corrupted Transaction Data",
                    fix: &format!(
                        "Transaction #{id} has the amount \"{amount}\", which is not a number. \
                        Fix or remove the transaction in the database and reload the page."
                    ),
                }
                .into_response()
            }
            Error::AmountOverflow { total } => {
                tracing::error!("could not add up transactions: the {total} is too large");
                InternalServerError {
                    description: "Transaction Totals Too Large",
                    fix: &format!(
                        "The {total} is too large to add up. \
                        Fix or remove the transactions with very large amounts and reload the page."
                    ),
                }
                .into_response()
            }
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. \
                        Change the date to today or earlier."
                    ),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("\"{amount}\" is not a number. Enter an amount like 12.34."),
                },
            ),
            Error::NegativeAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!(
                        "{amount} is negative. Enter a positive amount and choose \
                        whether it is income or an expense."
                    ),
                },
            ),
            Error::EmptyDescription => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Missing description".to_owned(),
                    details: "Enter a short description of the transaction.".to_owned(),
                },
            ),
            Error::InvalidRange { .. } => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid date range".to_owned(),
                    details: "The start date is later than the end date".to_owned(),
                },
            ),
            Error::RangeTooLong { maximum_days, .. } => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid date range".to_owned(),
                    details: format!("The calendar can show at most {maximum_days} days."),
                },
            ),
            Error::AmountOverflow { total } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Corrupted transaction data".to_owned(),
                    details: format!("The {total} is too large to add up."),
                },
            ),
            Error::MalformedAmount { id, amount } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Corrupted transaction data".to_owned(),
                    details: format!(
                        "Transaction #{id} has the amount \"{amount}\", which is not a number."
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body of the form
    /// `{"message": "..."}`.
    pub fn into_json_response(self) -> Response {
        let status_code = match &self {
            Error::InvalidCredentials | Error::CookieMissing | Error::CookieError(_) => {
                StatusCode::UNAUTHORIZED
            }
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::FutureDate(_)
            | Error::InvalidAmount(_)
            | Error::NegativeAmount(_)
            | Error::EmptyDescription
            | Error::InvalidRange { .. }
            | Error::RangeTooLong { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::MalformedAmount { .. }
            | Error::AmountOverflow { .. }
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::InvalidCalendarConfig { .. }
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "message": message }))).into_response()
    }
}
