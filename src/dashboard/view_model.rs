//! The data behind one render of the dashboard.

use time::{Date, Duration, UtcOffset};

use crate::{
    Error,
    dashboard::{
        CalendarConfig, GroupedTransaction,
        calendar::{CalendarGrid, build_calendar},
        grouping::{IncomeExpenseComparison, group_transactions, split_by_kind},
        heatmap::daily_expense_totals,
    },
    transaction::Transaction,
};

/// How many days the calendar shows when no range is requested.
pub const DEFAULT_RANGE_DAYS: i64 = 180;

/// The range of days requested for the expense calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    /// The first day.
    pub from: Date,
    /// The last day.
    pub to: Date,
}

impl DateRange {
    /// Fill in a partially specified range.
    ///
    /// A missing end defaults to `today` and a missing start to
    /// [DEFAULT_RANGE_DAYS] before the end. The range is not checked, an
    /// inverted range is reported when the calendar is built.
    pub fn resolve(from: Option<Date>, to: Option<Date>, today: Date) -> Self {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or_else(|| {
            to.checked_sub(Duration::days(DEFAULT_RANGE_DAYS))
                .unwrap_or(Date::MIN)
        });

        Self { from, to }
    }
}

/// Everything the dashboard shows, computed from the user's transactions and
/// the requested calendar range.
#[derive(Debug, PartialEq)]
pub struct DashboardViewModel {
    /// The calendar range as requested.
    pub range: DateRange,
    /// Today in the local timezone.
    pub today: Date,
    /// The offset used to show transaction dates.
    pub local_offset: UtcOffset,
    /// Groups of earnings, in first-seen order.
    pub income_groups: Vec<GroupedTransaction>,
    /// Groups of spending, in first-seen order.
    pub expense_groups: Vec<GroupedTransaction>,
    /// Total income against total expenses.
    pub comparison: IncomeExpenseComparison,
    /// The expense calendar, or the reason the range cannot be shown, e.g.
    /// [Error::InvalidRange] or [Error::RangeTooLong].
    pub calendar: Result<CalendarGrid, Error>,
    /// Whether the user has no transactions at all.
    pub is_empty: bool,
}

impl DashboardViewModel {
    /// Group `transactions` and lay out the calendar for `range`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::MalformedAmount] if a stored amount is not a number,
    /// - [Error::AmountOverflow] if a total is too large to represent.
    ///
    /// A bad range is not an error here, it is kept in
    /// [DashboardViewModel::calendar] so the rest of the dashboard can still
    /// be shown.
    pub fn build(
        transactions: &[Transaction],
        range: DateRange,
        today: Date,
        local_offset: UtcOffset,
        config: &CalendarConfig,
    ) -> Result<Self, Error> {
        let groups = group_transactions(transactions)?;
        let heatmap_values = daily_expense_totals(&groups, local_offset)?;
        let (income_groups, expense_groups) = split_by_kind(groups);
        let comparison = IncomeExpenseComparison::new(&income_groups, &expense_groups)?;
        let calendar = build_calendar(range.from, range.to, &heatmap_values, config);

        Ok(Self {
            range,
            today,
            local_offset,
            income_groups,
            expense_groups,
            comparison,
            calendar,
            is_empty: transactions.is_empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::{UtcOffset, macros::{date, datetime}};

    use crate::{
        Error,
        auth::UserID,
        dashboard::CalendarConfig,
        transaction::{RawAmount, Transaction, TransactionKind},
    };

    use super::{DashboardViewModel, DateRange};

    fn transaction(id: i64, description: &str, amount: &str, kind: TransactionKind) -> Transaction {
        Transaction {
            id,
            user_id: UserID::new(1),
            description: description.to_owned(),
            amount: RawAmount::Text(amount.to_owned()),
            kind,
            created_at: datetime!(2024-01-05 12:00 UTC),
        }
    }

    fn build(transactions: &[Transaction], range: DateRange) -> Result<DashboardViewModel, Error> {
        DashboardViewModel::build(
            transactions,
            range,
            date!(2024 - 01 - 31),
            UtcOffset::UTC,
            &CalendarConfig::default(),
        )
    }

    #[test]
    fn default_range_ends_today() {
        let range = DateRange::resolve(None, None, date!(2024 - 07 - 01));

        assert_eq!(range.to, date!(2024 - 07 - 01));
        assert_eq!(range.from, date!(2024 - 01 - 03));
    }

    #[test]
    fn partial_range_keeps_given_dates() {
        let today = date!(2024 - 07 - 01);

        assert_eq!(
            DateRange::resolve(Some(date!(2024 - 06 - 01)), None, today),
            DateRange {
                from: date!(2024 - 06 - 01),
                to: today
            }
        );
        assert_eq!(
            DateRange::resolve(None, Some(date!(2024 - 06 - 30)), today).from,
            date!(2024 - 01 - 02)
        );
    }

    #[test]
    fn splits_groups_and_fills_calendar() {
        let transactions = [
            transaction(1, "Coffee", "4.50", TransactionKind::Expense),
            transaction(2, "Salary", "100", TransactionKind::Income),
            transaction(3, "coffee", "5.50", TransactionKind::Expense),
        ];
        let range = DateRange {
            from: date!(2024 - 01 - 01),
            to: date!(2024 - 01 - 31),
        };

        let view_model = build(&transactions, range).unwrap();

        assert!(!view_model.is_empty);
        assert_eq!(view_model.income_groups.len(), 1);
        assert_eq!(view_model.expense_groups.len(), 1);
        assert_eq!(view_model.comparison.income, Decimal::from(100));
        assert_eq!(view_model.comparison.expenses, Decimal::from(10));

        let calendar = view_model.calendar.unwrap();
        let day = calendar
            .cells()
            .find(|cell| cell.date == date!(2024 - 01 - 05))
            .unwrap();
        assert_eq!(day.count, Decimal::from(10));
        assert_eq!(day.color_tier.level(), 2);
    }

    #[test]
    fn inverted_range_keeps_the_rest_of_the_dashboard() {
        let transactions = [transaction(1, "Coffee", "4.50", TransactionKind::Expense)];
        let range = DateRange {
            from: date!(2024 - 02 - 01),
            to: date!(2024 - 01 - 01),
        };

        let view_model = build(&transactions, range).unwrap();

        assert_eq!(
            view_model.calendar,
            Err(Error::InvalidRange {
                from: range.from,
                to: range.to
            })
        );
        assert_eq!(view_model.expense_groups.len(), 1);
    }

    #[test]
    fn malformed_amount_fails_the_whole_view() {
        let transactions = [transaction(7, "Coffee", "abc", TransactionKind::Expense)];
        let range = DateRange::resolve(None, None, date!(2024 - 01 - 31));

        assert_eq!(
            build(&transactions, range),
            Err(Error::MalformedAmount {
                id: 7,
                amount: "abc".to_owned()
            })
        );
    }

    #[test]
    fn too_long_range_keeps_the_rest_of_the_dashboard() {
        let transactions = [transaction(1, "Coffee", "4.50", TransactionKind::Expense)];
        let range = DateRange {
            from: date!(2000 - 01 - 01),
            to: date!(2024 - 01 - 31),
        };

        let view_model = build(&transactions, range).unwrap();

        assert!(matches!(
            view_model.calendar,
            Err(Error::RangeTooLong { .. })
        ));
        assert_eq!(view_model.expense_groups.len(), 1);
    }

    #[test]
    fn overflowing_totals_fail_the_whole_view() {
        let transactions = [
            transaction(1, "Rent", "79228162514264337593543950335", TransactionKind::Income),
            transaction(2, "Bonus", "79228162514264337593543950335", TransactionKind::Income),
        ];
        let range = DateRange::resolve(None, None, date!(2024 - 01 - 31));

        assert!(matches!(
            build(&transactions, range),
            Err(Error::AmountOverflow { .. })
        ));
    }

    #[test]
    fn no_transactions_gives_an_empty_calendar() {
        let range = DateRange::resolve(None, None, date!(2024 - 01 - 31));

        let view_model = build(&[], range).unwrap();

        assert!(view_model.is_empty);
        let calendar = view_model.calendar.unwrap();
        assert!(calendar.cells().all(|cell| cell.color_tier.level() == 0));
    }
}
