//! Lays out the days of a date range as a calendar of week rows and buckets
//! each day's expenses into a colour tier.

use std::{collections::HashMap, iter::FusedIterator};

use rust_decimal::Decimal;
use time::{Date, Duration, Month, Weekday};

use crate::{
    Error,
    dashboard::{HeatmapValue, grouping::checked_total},
};

/// The fewest days the calendar shows, counting both ends of the range.
pub const MINIMUM_WINDOW_DAYS: i64 = 90;

/// The most days the calendar shows, counting both ends of the range.
///
/// About five years.
pub const MAXIMUM_WINDOW_DAYS: i64 = 1830;

/// The lower bounds of the colour tiers.
///
/// A day with a total at or below the first threshold gets tier 0, otherwise
/// the tier is one more than the number of later thresholds the total reaches.
pub const COLOR_TIER_THRESHOLDS: [u32; 4] = [0, 10, 50, 100];

/// The tunable constants of the expense calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConfig {
    /// The fewest days the calendar shows, see [MINIMUM_WINDOW_DAYS].
    pub minimum_window_days: i64,
    /// The most days the calendar shows, see [MAXIMUM_WINDOW_DAYS].
    pub maximum_window_days: i64,
    /// The colour tier thresholds, see [COLOR_TIER_THRESHOLDS].
    pub tier_thresholds: [u32; 4],
}

impl CalendarConfig {
    /// Check that the window bounds can be satisfied together.
    ///
    /// # Errors
    /// Returns [Error::InvalidCalendarConfig] if the minimum window is less
    /// than a day or longer than the maximum window.
    pub fn validate(&self) -> Result<(), Error> {
        if self.minimum_window_days < 1 || self.minimum_window_days > self.maximum_window_days {
            return Err(Error::InvalidCalendarConfig {
                minimum_days: self.minimum_window_days,
                maximum_days: self.maximum_window_days,
            });
        }

        Ok(())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            minimum_window_days: MINIMUM_WINDOW_DAYS,
            maximum_window_days: MAXIMUM_WINDOW_DAYS,
            tier_thresholds: COLOR_TIER_THRESHOLDS,
        }
    }
}

/// How strongly a day is coloured, from 0 (nothing spent) to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ColorTier(u8);

impl ColorTier {
    /// The tier as a number from 0 to 4.
    pub fn level(self) -> u8 {
        self.0
    }
}

/// Bucket a day's total into a colour tier.
pub fn color_tier(count: Decimal, thresholds: &[u32; 4]) -> ColorTier {
    let [lowest, higher @ ..] = thresholds;

    if count <= Decimal::from(*lowest) {
        return ColorTier(0);
    }

    let reached = higher
        .iter()
        .filter(|&&threshold| count >= Decimal::from(threshold))
        .count();

    // At most three higher thresholds, so the tier always fits.
    ColorTier(1 + reached as u8)
}

/// The last day the calendar shows for the range `from..=to`.
///
/// The calendar always shows at least `minimum_window_days` days starting at
/// `from`, and never cuts off a longer range.
///
/// # Errors
/// Returns [Error::InvalidRange] if `from` is after `to`.
pub fn effective_end(from: Date, to: Date, minimum_window_days: i64) -> Result<Date, Error> {
    if from > to {
        return Err(Error::InvalidRange { from, to });
    }

    let minimum_end = from
        .checked_add(Duration::days(minimum_window_days.saturating_sub(1).max(0)))
        .unwrap_or(Date::MAX);

    Ok(to.max(minimum_end))
}

/// Every day from a start date to an end date, both included.
#[derive(Debug, Clone)]
pub struct DaySequence {
    next: Option<Date>,
    last: Date,
}

impl DaySequence {
    /// The days from `first` to `last`, empty if `first` is after `last`.
    pub fn new(first: Date, last: Date) -> Self {
        Self {
            next: Some(first),
            last,
        }
    }
}

impl Iterator for DaySequence {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|date| *date <= self.last)?;
        self.next = current.next_day();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(next) if next <= self.last => (self.last - next).whole_days() as usize + 1,
            _ => 0,
        };

        (remaining, Some(remaining))
    }
}

impl FusedIterator for DaySequence {}

/// Split days into rows that each start on a Sunday.
///
/// The first and last rows may hold fewer than seven days.
pub fn week_rows(days: impl IntoIterator<Item = Date>) -> Vec<Vec<Date>> {
    let mut weeks: Vec<Vec<Date>> = Vec::new();

    for day in days {
        match weeks.last_mut() {
            Some(week) if day.weekday() != Weekday::Sunday => week.push(day),
            _ => weeks.push(vec![day]),
        }
    }

    weeks
}

/// A month name placed above the first week row that starts in that month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthLabel {
    /// The row the label sits above.
    pub week_index: usize,
    /// The month of the first day in that row.
    pub month: Month,
}

impl MonthLabel {
    /// The month as a three letter abbreviation, e.g. "Jan".
    pub fn text(&self) -> &'static str {
        match self.month {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        }
    }
}

fn month_labels(weeks: &[Vec<Date>]) -> Vec<MonthLabel> {
    let mut labels = Vec::new();
    let mut previous_month = None;

    for (week_index, week) in weeks.iter().enumerate() {
        let Some(first_day) = week.first() else {
            continue;
        };

        if previous_month != Some(first_day.month()) {
            labels.push(MonthLabel {
                week_index,
                month: first_day.month(),
            });
        }

        previous_month = Some(first_day.month());
    }

    labels
}

/// A single day in the calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarCell {
    /// The row of the week containing the day.
    pub week_index: usize,
    /// Days since Sunday, 0 to 6.
    pub weekday_index: u8,
    /// The day itself.
    pub date: Date,
    /// How strongly the day is coloured.
    pub color_tier: ColorTier,
    /// The amount spent on the day.
    pub count: Decimal,
}

/// The days of the calendar laid out as week rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    /// The first day shown.
    pub from: Date,
    /// The last day shown, after applying the minimum window.
    pub to: Date,
    /// One row per week, each holding the cells for the days in that week.
    pub weeks: Vec<Vec<CalendarCell>>,
    /// Labels for the rows where a new month starts.
    pub month_labels: Vec<MonthLabel>,
}

impl CalendarGrid {
    /// All cells in date order.
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }
}

/// Lay out the expense calendar for `from..=to`.
///
/// `values` are the daily expense totals, days missing from `values` count as
/// zero.
///
/// # Errors
/// Returns:
/// - [Error::InvalidRange] if `from` is after `to`,
/// - [Error::RangeTooLong] if the calendar would show more than
///   `config.maximum_window_days` days,
/// - [Error::AmountOverflow] if a day's total is too large to represent.
pub fn build_calendar(
    from: Date,
    to: Date,
    values: &[HeatmapValue],
    config: &CalendarConfig,
) -> Result<CalendarGrid, Error> {
    let end = effective_end(from, to, config.minimum_window_days)?;

    if (end - from).whole_days() + 1 > config.maximum_window_days {
        return Err(Error::RangeTooLong {
            from,
            to: end,
            maximum_days: config.maximum_window_days,
        });
    }

    let mut counts: HashMap<Date, Decimal> = HashMap::new();
    for value in values {
        let count = counts.entry(value.date).or_default();
        *count = checked_total(*count, value.count, || {
            format!("total spent on {}", value.date)
        })?;
    }

    let weeks = week_rows(DaySequence::new(from, end));
    let month_labels = month_labels(&weeks);

    let weeks = weeks
        .into_iter()
        .enumerate()
        .map(|(week_index, days)| {
            days.into_iter()
                .map(|date| {
                    let count = counts.get(&date).copied().unwrap_or_default();

                    CalendarCell {
                        week_index,
                        weekday_index: date.weekday().number_days_from_sunday(),
                        date,
                        color_tier: color_tier(count, &config.tier_thresholds),
                        count,
                    }
                })
                .collect()
        })
        .collect();

    Ok(CalendarGrid {
        from,
        to: end,
        weeks,
        month_labels,
    })
}
