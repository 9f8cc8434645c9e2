//! The JSON API for listing and recording transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    timezone::get_local_offset,
    transaction::{
        RawAmount, TransactionId, TransactionKind, create_endpoint::CreateTransactionState,
        create_transaction, get_transaction, get_transactions_for_user, validate_new_transaction,
    },
};

/// The JSON body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    /// What the transaction was for.
    pub description: String,
    /// The amount as a number or a numeric string.
    pub amount: RawAmount,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// When the transaction happened, defaults to today.
    #[serde(default)]
    pub date: Option<Date>,
}

/// List the transactions of the logged in user, oldest first.
pub async fn list_transactions(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match get_transactions_for_user(user_id, &connection) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_json_response(),
    }
}

/// Get one transaction of the logged in user.
pub async fn get_transaction_json(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match get_transaction(transaction_id, user_id, &connection) {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => error.into_json_response(),
    }
}

/// Record a transaction for the logged in user.
///
/// Responds with 201 and the stored transaction, or 400 with a message if the
/// request is invalid.
pub async fn create_transaction_json(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<NewTransactionRequest>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_json_response();
    };

    let new_transaction = match validate_new_transaction(
        user_id,
        &request.description,
        &request.amount,
        request.kind,
        request.date,
        local_offset,
    ) {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_json_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match create_transaction(new_transaction, &connection) {
        Ok(transaction) => {
            tracing::info!("User {user_id} recorded transaction {} via the API", transaction.id);
            (StatusCode::CREATED, Json(transaction)).into_response()
        }
        Err(error) => error.into_json_response(),
    }
}
