//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for the dashboard page and the calendar fragment
//! - HTML view functions for rendering the dashboard UI
//! - State and query types used by the handlers

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// axum_extra's Query parses an empty date input as None.
use axum_extra::extract::Query;
use axum_htmx::HX_PUSH_URL;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    dashboard::{
        CalendarConfig,
        calendar_view::{calendar_fragment, calendar_section},
        charts::{DashboardChart, build_dashboard_charts, charts_script, charts_view},
        tables::grouped_transactions_table,
        view_model::{DashboardViewModel, DateRange},
    },
    endpoints,
    html::{
        ECHARTS_SCRIPT, HeadElement, PAGE_CONTAINER_STYLE, base, dollar_input_styles,
        format_currency,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{create_endpoint::dashboard_url, get_transactions_for_user, new_transaction_form},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The tunable constants of the expense calendar.
    pub calendar_config: CalendarConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            calendar_config: state.calendar_config.clone(),
        }
    }
}

/// The calendar range in the query string, e.g. `?from=2024-01-01&to=2024-03-31`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// The first day of the calendar.
    pub from: Option<Date>,
    /// The last day of the calendar.
    pub to: Option<Date>,
}

/// Fetch the user's transactions and build the view model for `query`.
fn load_view_model(
    state: &DashboardState,
    user_id: UserID,
    query: &RangeQuery,
    connection: &Connection,
) -> Result<DashboardViewModel, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    let range = DateRange::resolve(query.from, query.to, today);

    let transactions = get_transactions_for_user(user_id, connection).inspect_err(|error| {
        tracing::error!("Could not get transactions for user {user_id}: {error}")
    })?;

    let view_model = DashboardViewModel::build(
        &transactions,
        range,
        today,
        local_offset,
        &state.calendar_config,
    )
    .inspect_err(|error| tracing::error!("Could not build dashboard for user {user_id}: {error}"))?;

    if let Err(error) = &view_model.calendar {
        tracing::info!("User {user_id} requested an invalid calendar range: {error}");
    }

    Ok(view_model)
}

/// Display a page with an overview of the user's transactions.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get user {user_id}: {error}"))?;

    let view_model = load_view_model(&state, user_id, &query, &connection)?;

    let email = user.email.to_string();
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).user_email(&email);

    Ok(dashboard_view(nav_bar, &view_model).into_response())
}

/// Re-render the expense calendar for a new range.
///
/// The browser URL is updated to the dashboard with the new range so that a
/// reload keeps it.
pub async fn get_dashboard_calendar(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let view_model = match load_view_model(&state, user_id, &query, &connection) {
        Ok(view_model) => view_model,
        Err(error) => return error.into_alert_response(),
    };

    let push_url = dashboard_url(Some(view_model.range.from), Some(view_model.range.to));

    (
        [(HX_PUSH_URL, push_url)],
        calendar_fragment(&view_model.calendar),
    )
        .into_response()
}

fn summary_view(view_model: &DashboardViewModel) -> Markup {
    let net = view_model.comparison.income - view_model.comparison.expenses;

    html! {
        div class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            @for (label, amount, style) in [
                ("Income", view_model.comparison.income, "text-green-600 dark:text-green-400"),
                ("Expenses", view_model.comparison.expenses, "text-red-600 dark:text-red-400"),
            ] {
                div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    p class="text-sm text-gray-600 dark:text-gray-400" { (label) }
                    p class={"text-2xl font-bold " (style)} { (format_currency(amount)) }
                }
            }

            div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
            {
                p class="text-sm text-gray-600 dark:text-gray-400" { "Net" }
                p class="text-2xl font-bold"
                {
                    @if net.is_sign_negative() && !net.is_zero() {
                        "-" (format_currency(net.abs()))
                    } @else {
                        (format_currency(net))
                    }
                }
            }
        }
    }
}

fn no_data_view() -> Markup {
    html! {
        div class="w-full text-center"
        {
            h2 class="text-xl font-bold" { "Nothing here yet" }

            p
            {
                "Charts and your spending calendar will show up here once you
                record some transactions. Use the form below to add your first one."
            }
        }
    }
}

/// Renders the dashboard page.
fn dashboard_view(nav_bar: NavBar, view_model: &DashboardViewModel) -> Markup {
    let nav_bar = nav_bar.into_html();
    let charts: Option<[DashboardChart; 3]> = (!view_model.is_empty).then(|| {
        build_dashboard_charts(
            &view_model.income_groups,
            &view_model.expense_groups,
            view_model.comparison,
        )
    });
    let form = new_transaction_form(
        view_model.today,
        Some(view_model.range.from),
        Some(view_model.range.to),
    );

    let content = html!(
        (nav_bar)

        div id="dashboard-content" class=(PAGE_CONTAINER_STYLE)
        {
            @if view_model.is_empty {
                (no_data_view())
            } @else {
                (summary_view(view_model))
            }

            div class="grid grid-cols-1 lg:grid-cols-3 gap-6 w-full"
            {
                div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    (form)
                }

                div class="lg:col-span-2 p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    (calendar_section(view_model.range, &view_model.calendar))
                }
            }

            @if let Some(charts) = &charts {
                (charts_view(charts))

                div class="grid grid-cols-1 xl:grid-cols-2 gap-6 w-full"
                {
                    (grouped_transactions_table(
                        "Expenses",
                        &view_model.expense_groups,
                        false,
                        view_model.local_offset,
                    ))
                    (grouped_transactions_table(
                        "Income",
                        &view_model.income_groups,
                        true,
                        view_model.local_offset,
                    ))
                }
            }
        }
    );

    let mut head_elements = vec![dollar_input_styles()];

    if let Some(charts) = &charts {
        head_elements.push(HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()));
        head_elements.push(charts_script(charts));
    }

    base("Dashboard", &head_elements, &content)
}
