//! Table views for grouped transactions.
//!
//! Each group is a row with its total, and expands to show the date and
//! amount of every transaction in the group.

use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    dashboard::GroupedTransaction,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Renders a table of groups under `title`.
///
/// `is_income` picks the colour of the amounts, green for income and red for
/// expenses. Transaction dates are shown in `local_offset`.
pub fn grouped_transactions_table(
    title: &str,
    groups: &[GroupedTransaction],
    is_income: bool,
    local_offset: UtcOffset,
) -> Markup {
    let amount_style = if is_income {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    };

    html! {
        div class="w-full"
        {
            h3 class="text-xl font-semibold mb-4" { (title) }

            @if groups.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "No transactions yet." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Total" }
                            }
                        }

                        tbody
                        {
                            @for group in groups {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th scope="row" class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
                                    {
                                        details
                                        {
                                            summary class="cursor-pointer" { (group.description) }

                                            ul class="mt-2 space-y-1 font-normal text-gray-500 dark:text-gray-400"
                                            {
                                                @for member in &group.transactions {
                                                    li
                                                    {
                                                        (member.transaction.created_at.to_offset(local_offset).date())
                                                        ": "
                                                        (format_currency(member.amount))
                                                    }
                                                }
                                            }
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (group.transactions.len()) }
                                    td class={(TABLE_CELL_STYLE) " text-right " (amount_style)}
                                    {
                                        (format_currency(group.total_amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
