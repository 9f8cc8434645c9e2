//! Pie charts for the dashboard.
//!
//! This module creates interactive ECharts visualizations of the grouped transactions:
//! - **Expenses**: how spending splits across expense groups
//! - **Income**: how earnings split across income groups
//! - **Income vs Expenses**: the two totals side by side
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with a matching HTML container and JavaScript initialization code.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{ItemStyle, JsFunction, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    dashboard::{GroupedTransaction, grouping::IncomeExpenseComparison},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-3 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Build the three dashboard pie charts.
pub fn build_dashboard_charts(
    income_groups: &[GroupedTransaction],
    expense_groups: &[GroupedTransaction],
    comparison: IncomeExpenseComparison,
) -> [DashboardChart; 3] {
    [
        DashboardChart {
            id: "expenses-chart",
            options: groups_chart("Expenses", "Grouped by description", expense_groups)
                .to_string(),
        },
        DashboardChart {
            id: "income-chart",
            options: groups_chart("Income", "Grouped by description", income_groups).to_string(),
        },
        DashboardChart {
            id: "comparison-chart",
            options: comparison_chart(comparison).to_string(),
        },
    ]
}

fn groups_chart(title: &str, subtitle: &str, groups: &[GroupedTransaction]) -> Chart {
    let data = groups
        .iter()
        .map(|group| (to_chart_value(group.total_amount), group.description.clone()))
        .collect::<Vec<_>>();

    pie_chart(title, subtitle, title, data)
}

fn comparison_chart(comparison: IncomeExpenseComparison) -> Chart {
    let data = vec![
        (to_chart_value(comparison.income), "Income".to_owned()),
        (to_chart_value(comparison.expenses), "Expenses".to_owned()),
    ];

    pie_chart("Income vs Expenses", "All time", "Total", data)
}

fn pie_chart(title: &str, subtitle: &str, series_name: &str, data: Vec<(f64, String)>) -> Chart {
    Chart::new()
        .title(Title::new().text(title).subtext(subtitle).left("center"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("2%"))
        .series(
            Pie::new()
                .name(series_name)
                .radius(vec!["35%", "65%"])
                .item_style(ItemStyle::new().border_radius(4))
                .data(data),
        )
}

fn to_chart_value(amount: Decimal) -> f64 {
    amount.round_dp(2).to_f64().unwrap_or_default()
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        // Use USD instead of NZD since it is easier to read (No 'NZ' prefix)
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use scraper::{Html, Selector};

    use crate::{
        dashboard::{GroupedTransaction, grouping::IncomeExpenseComparison},
        transaction::TransactionKind,
    };

    use super::{build_dashboard_charts, charts_view};

    fn group(description: &str, kind: TransactionKind, total: &str) -> GroupedTransaction {
        GroupedTransaction {
            description: description.to_owned(),
            kind,
            total_amount: Decimal::from_str(total).unwrap(),
            transactions: vec![],
        }
    }

    #[test]
    fn builds_three_pies() {
        let income = [group("Salary", TransactionKind::Income, "2000")];
        let expenses = [
            group("Coffee", TransactionKind::Expense, "7.50"),
            group("Rent", TransactionKind::Expense, "450.25"),
        ];
        let comparison = IncomeExpenseComparison::new(&income, &expenses).unwrap();

        let charts = build_dashboard_charts(&income, &expenses, comparison);

        let ids = charts.iter().map(|chart| chart.id).collect::<Vec<_>>();
        assert_eq!(ids, ["expenses-chart", "income-chart", "comparison-chart"]);

        let expense_options = &charts[0].options;
        let coffee = expense_options.find("\"Coffee\"").expect("missing Coffee slice");
        let rent = expense_options.find("\"Rent\"").expect("missing Rent slice");
        assert!(coffee < rent);
        assert!(!expense_options.contains("\"Salary\""));

        assert!(charts[2].options.contains("\"Income\""));
        assert!(charts[2].options.contains("\"Expenses\""));
    }

    #[test]
    fn renders_a_container_per_chart() {
        let charts = build_dashboard_charts(
            &[],
            &[],
            IncomeExpenseComparison {
                income: Decimal::ZERO,
                expenses: Decimal::ZERO,
            },
        );

        let html = Html::parse_fragment(&charts_view(&charts).into_string());

        for chart in &charts {
            let selector = Selector::parse(&format!("#{}", chart.id)).unwrap();
            assert!(html.select(&selector).next().is_some(), "missing {}", chart.id);
        }
    }
}
