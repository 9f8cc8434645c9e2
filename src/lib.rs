//! Spendwise is a web app for tracking personal income and expenses.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! small JSON API for listing and recording transactions. The dashboard groups
//! transactions by description and renders an expense calendar heatmap.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, count_users, create_user, get_user_by_email,
    parse_email,
};
pub use dashboard::{
    COLOR_TIER_THRESHOLDS, CalendarCell, CalendarConfig, CalendarGrid, ColorTier,
    DashboardViewModel, DateRange, DaySequence, GroupMember, GroupedTransaction, HeatmapValue,
    IncomeExpenseComparison, MAXIMUM_WINDOW_DAYS, MINIMUM_WINDOW_DAYS, MonthLabel,
    build_calendar, color_tier,
    daily_expense_totals, effective_end, group_transactions, split_by_kind, week_rows,
};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, RawAmount, Transaction, TransactionKind, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
