//! Dashboard module
//!
//! Turns the user's transactions into the dashboard: groups of transactions
//! that share a description, pie charts of those groups and a calendar
//! heatmap of daily spending.

mod calendar;
mod calendar_view;
mod charts;
mod grouping;
mod handlers;
mod heatmap;
mod tables;
mod view_model;

pub use calendar::{
    COLOR_TIER_THRESHOLDS, CalendarCell, CalendarConfig, CalendarGrid, ColorTier, DaySequence,
    MAXIMUM_WINDOW_DAYS, MINIMUM_WINDOW_DAYS, MonthLabel, build_calendar, color_tier,
    effective_end, week_rows,
};
pub use grouping::{
    GroupMember, GroupedTransaction, IncomeExpenseComparison, group_transactions, split_by_kind,
};
pub use handlers::{get_dashboard_calendar, get_dashboard_page};
pub use heatmap::{HeatmapValue, daily_expense_totals};
pub use view_model::{DashboardViewModel, DateRange};
