//! The form for recording a transaction, shown on the dashboard.

use maud::{Markup, html};
use time::Date;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::TransactionKind,
};

/// Render the new transaction form.
///
/// `max_date` is today in the local timezone. `from` and `to` are the
/// calendar range currently shown, sent back so the dashboard keeps them
/// after the redirect.
pub fn new_transaction_form(max_date: Date, from: Option<Date>, to: Option<Date>) -> Markup {
    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#transaction-indicator"
            class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "New Transaction" }

            @if let Some(from) = from {
                input type="hidden" name="from" value=(from);
            }

            @if let Some(to) = to {
                input type="hidden" name="to" value=(to);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Coffee"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                // w-full needed to ensure input takes the full width when prefilled with a value
                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (kind, text, checked) in [
                        (TransactionKind::Expense, "Expense", true),
                        (TransactionKind::Income, "Income", false),
                    ] {
                        label class="flex-1"
                        {
                            input
                                type="radio"
                                name="type"
                                value=(kind)
                                checked[checked]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            span class=(FORM_RADIO_LABEL_STYLE) { (text) }
                        }
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    max=(max_date)
                    value=(max_date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="transaction-indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                "Add Transaction"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form,
        },
    };

    use super::new_transaction_form;

    #[test]
    fn renders_inputs() {
        let markup = new_transaction_form(date!(2024 - 03 - 01), None, None);
        let html = Html::parse_fragment(&markup.into_string());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "type", "radio");
        assert_form_submit_button(&form);

        let date = form
            .select(&Selector::parse("input[name=date]").unwrap())
            .next()
            .unwrap();
        assert_eq!(date.value().attr("max"), Some("2024-03-01"));
    }

    #[test]
    fn carries_calendar_range() {
        let markup = new_transaction_form(
            date!(2024 - 03 - 01),
            Some(date!(2024 - 01 - 01)),
            Some(date!(2024 - 02 - 01)),
        );
        let html = Html::parse_fragment(&markup.into_string());

        let hidden = html
            .select(&Selector::parse("input[type=hidden]").unwrap())
            .map(|input| {
                (
                    input.value().attr("name").unwrap(),
                    input.value().attr("value").unwrap(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(hidden, [("from", "2024-01-01"), ("to", "2024-02-01")]);
    }
}
