//! Collapses transactions into groups that share a description and a type.
//!
//! Groups feed the grouped lists on the dashboard, the pie charts and, once
//! filtered to expenses, the calendar heatmap.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{
    Error,
    transaction::{Transaction, TransactionKind},
};

/// Transactions that share a description and a type.
///
/// Descriptions are compared ignoring case and surrounding whitespace, so
/// "Coffee" and " coffee" end up in the same group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTransaction {
    /// The description of the transaction that started the group, as entered.
    pub description: String,
    /// Whether the money in this group was spent or earned.
    pub kind: TransactionKind,
    /// The sum of the amounts of the transactions in the group.
    pub total_amount: Decimal,
    /// The transactions in the group, in input order.
    pub transactions: Vec<GroupMember>,
}

/// A transaction in a group along with its parsed amount.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    /// The transaction as it was stored.
    pub transaction: Transaction,
    /// The amount of `transaction`.
    pub amount: Decimal,
}

type GroupKey = (String, TransactionKind);

fn group_key(transaction: &Transaction) -> GroupKey {
    (
        transaction.description.trim().to_lowercase(),
        transaction.kind,
    )
}

/// Add `amount` to `total`, failing instead of overflowing.
///
/// `describe_total` names the total for the error message.
pub(crate) fn checked_total(
    total: Decimal,
    amount: Decimal,
    describe_total: impl FnOnce() -> String,
) -> Result<Decimal, Error> {
    total.checked_add(amount).ok_or_else(|| Error::AmountOverflow {
        total: describe_total(),
    })
}

/// Group `transactions` by description and type.
///
/// Groups are returned in the order their first transaction appears in
/// `transactions`.
///
/// # Errors
/// Returns:
/// - [Error::MalformedAmount] if the amount of any transaction is not a number,
/// - [Error::AmountOverflow] if the total of a group is too large to represent.
///
/// No groups are returned in either case.
pub fn group_transactions(transactions: &[Transaction]) -> Result<Vec<GroupedTransaction>, Error> {
    let mut groups: Vec<GroupedTransaction> = Vec::new();
    let mut group_indices: HashMap<GroupKey, usize> = HashMap::new();

    for transaction in transactions {
        let amount = transaction.amount.to_decimal(transaction.id)?;

        let index = *group_indices
            .entry(group_key(transaction))
            .or_insert_with(|| {
                groups.push(GroupedTransaction {
                    description: transaction.description.clone(),
                    kind: transaction.kind,
                    total_amount: Decimal::ZERO,
                    transactions: Vec::new(),
                });
                groups.len() - 1
            });

        if let Some(group) = groups.get_mut(index) {
            group.total_amount = checked_total(group.total_amount, amount, || {
                format!(
                    "total of the group \"{}\" at transaction #{}",
                    group.description, transaction.id
                )
            })?;
            group.transactions.push(GroupMember {
                transaction: transaction.clone(),
                amount,
            });
        }
    }

    Ok(groups)
}

/// Split groups into income groups and expense groups, keeping their order.
pub fn split_by_kind(
    groups: Vec<GroupedTransaction>,
) -> (Vec<GroupedTransaction>, Vec<GroupedTransaction>) {
    groups
        .into_iter()
        .partition(|group| group.kind == TransactionKind::Income)
}

/// The sum of the totals of `groups`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum is too large to represent.
pub fn sum_totals(groups: &[GroupedTransaction]) -> Result<Decimal, Error> {
    groups.iter().try_fold(Decimal::ZERO, |total, group| {
        checked_total(total, group.total_amount, || {
            format!("total {} across all groups", group.kind)
        })
    })
}

/// Total income next to total expenses, the two slices of the comparison chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeExpenseComparison {
    /// The sum of all income groups.
    pub income: Decimal,
    /// The sum of all expense groups.
    pub expenses: Decimal,
}

impl IncomeExpenseComparison {
    /// Sum each side of the comparison.
    ///
    /// # Errors
    /// Returns [Error::AmountOverflow] if either side is too large to represent.
    pub fn new(
        income_groups: &[GroupedTransaction],
        expense_groups: &[GroupedTransaction],
    ) -> Result<Self, Error> {
        Ok(Self {
            income: sum_totals(income_groups)?,
            expenses: sum_totals(expense_groups)?,
        })
    }
}
