//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its amount and type, and database functions,
//! - the dashboard form and the htmx endpoint that handles it,
//! - the JSON API for listing and creating transactions.

mod amount;
mod api;
mod core;
pub(crate) mod create_endpoint;
mod form;

pub use amount::RawAmount;
pub use api::{create_transaction_json, get_transaction_json, list_transactions};
pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionKind, create_transaction,
    create_transaction_table, get_transaction, get_transactions_for_user,
};
pub use create_endpoint::{create_transaction_endpoint, validate_new_transaction};
pub use form::new_transaction_form;
