//! Renders the expense calendar as an inline SVG heatmap.

use maud::{Markup, html};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    alert::Alert,
    dashboard::{
        calendar::{CalendarCell, CalendarGrid},
        view_model::DateRange,
    },
    endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_currency},
};

const CELL_SIZE: usize = 25;
const CELL_GAP: usize = 8;
const CELL_PITCH: usize = CELL_SIZE + CELL_GAP;
const LEFT_PADDING: usize = 40;
const TOP_PADDING: usize = 24;
const MONTH_LABEL_Y: usize = 14;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Fill colours indexed by colour tier.
const TIER_COLORS: [&str; 5] = [
    "#e5e7eb", // gray-200
    "#bbf7d0", // green-200
    "#4ade80", // green-400
    "#16a34a", // green-600
    "#166534", // green-800
];

const TOOLTIP_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day] [month repr:short] [year]");

fn tooltip_date(date: Date) -> String {
    date.format(TOOLTIP_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

fn tier_color(cell: &CalendarCell) -> &'static str {
    TIER_COLORS
        .get(usize::from(cell.color_tier.level()))
        .copied()
        .unwrap_or(TIER_COLORS[0])
}

/// The calendar heading, the range picker and the calendar itself.
pub fn calendar_section(range: DateRange, calendar: &Result<CalendarGrid, Error>) -> Markup {
    html! {
        section id="expense-calendar" class="w-full"
        {
            h3 class="text-xl font-semibold mb-4" { "Spending Calendar" }

            form
                hx-get=(endpoints::DASHBOARD_CALENDAR_API)
                hx-target="#calendar"
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                hx-trigger="change"
                class="flex flex-row flex-wrap gap-4 mb-4"
            {
                div
                {
                    label for="from" class=(FORM_LABEL_STYLE) { "From" }
                    input
                        type="date"
                        name="from"
                        id="from"
                        value=(range.from)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="to" class=(FORM_LABEL_STYLE) { "To" }
                    input
                        type="date"
                        name="to"
                        id="to"
                        value=(range.to)
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            (calendar_fragment(calendar))
        }
    }
}

/// The calendar on its own, swapped in by htmx when the range changes.
///
/// An inverted range shows a warning in place of the calendar.
pub fn calendar_fragment(calendar: &Result<CalendarGrid, Error>) -> Markup {
    html! {
        div id="calendar" class="relative w-full overflow-x-auto"
        {
            @match calendar {
                Ok(grid) => (calendar_svg(grid)),
                Err(Error::InvalidRange { .. }) => (Alert::Warning {
                    message: "The start date is later than the end date".to_owned(),
                    details: "Pick a start date on or before the end date.".to_owned(),
                }.into_html()),
                Err(Error::RangeTooLong { maximum_days, .. }) => (Alert::Warning {
                    message: "The date range is too long".to_owned(),
                    details: format!("Pick a range of at most {maximum_days} days."),
                }.into_html()),
                Err(error) => (Alert::Error {
                    message: "Could not show the calendar".to_owned(),
                    details: error.to_string(),
                }.into_html()),
            }
        }
    }
}

fn calendar_svg(grid: &CalendarGrid) -> Markup {
    let width = LEFT_PADDING + CELL_PITCH * grid.weeks.len();
    let height = TOP_PADDING + CELL_PITCH * WEEKDAYS.len();

    html! {
        svg
            width=(width)
            height=(height)
            role="img"
            aria-label={ "Expenses from " (grid.from) " to " (grid.to) }
            data-from=(grid.from)
            data-to=(grid.to)
        {
            @for label in &grid.month_labels {
                text
                    x=(label.week_index * CELL_PITCH + LEFT_PADDING)
                    y=(MONTH_LABEL_Y)
                    font-size="12"
                    font-weight="600"
                    fill="#374151"
                {
                    (label.text())
                }
            }

            @for (index, weekday) in WEEKDAYS.iter().enumerate() {
                text
                    x="4"
                    y=(index * CELL_PITCH + TOP_PADDING + CELL_SIZE - 8)
                    font-size="10"
                    fill="#4b5563"
                {
                    (weekday)
                }
            }

            @for cell in grid.cells() {
                rect
                    x=(cell.week_index * CELL_PITCH + LEFT_PADDING)
                    y=(usize::from(cell.weekday_index) * CELL_PITCH + TOP_PADDING)
                    width=(CELL_SIZE)
                    height=(CELL_SIZE)
                    rx="2"
                    ry="2"
                    fill=(tier_color(cell))
                    data-date=(cell.date)
                    data-count=(cell.count.round_dp(2))
                    data-tier=(cell.color_tier.level())
                {
                    title { (tooltip_date(cell.date)) ": " (format_currency(cell.count)) }
                }
            }
        }

        div class="flex items-center gap-1 mt-2 text-xs text-gray-600 dark:text-gray-400"
        {
            span class="me-1" { "Less" }
            @for color in TIER_COLORS {
                span class="inline-block w-3 h-3 rounded-sm" style={ "background-color: " (color) } {}
            }
            span class="ms-1" { "More" }
        }

        div
            id="calendar-tooltip"
            class="hidden absolute z-10 px-2 py-1 text-sm rounded shadow bg-white text-black pointer-events-none"
        {}
    }
}
