//! Daily expense totals for the calendar heatmap.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::{Date, UtcOffset};

use crate::{
    Error,
    dashboard::{GroupedTransaction, grouping::checked_total},
    transaction::TransactionKind,
};

/// The total spent on a single day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapValue {
    /// The day, in the local timezone.
    pub date: Date,
    /// The sum of the expenses on `date`.
    pub count: Decimal,
}

/// Sum the expenses in `groups` per local day.
///
/// Income groups are ignored. Days without expenses are left out, the
/// calendar treats them as zero. Values are sorted by date.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a day's total is too large to represent.
pub fn daily_expense_totals(
    groups: &[GroupedTransaction],
    local_offset: UtcOffset,
) -> Result<Vec<HeatmapValue>, Error> {
    let mut totals: BTreeMap<Date, Decimal> = BTreeMap::new();

    let expenses = groups
        .iter()
        .filter(|group| group.kind == TransactionKind::Expense)
        .flat_map(|group| &group.transactions);

    for member in expenses {
        let date = member.transaction.created_at.to_offset(local_offset).date();
        let total = totals.entry(date).or_default();
        *total = checked_total(*total, member.amount, || format!("total spent on {date}"))?;
    }

    Ok(totals
        .into_iter()
        .map(|(date, count)| HeatmapValue { date, count })
        .collect())
}
