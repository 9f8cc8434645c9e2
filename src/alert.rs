//! Alert messages shown to users, either swapped into the page's alert
//! container by htmx or rendered inline.

use maud::{Markup, html};

/// An alert message with a short summary and a longer explanation.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something needs the user's attention but nothing failed.
    Warning {
        /// The summary shown in bold.
        message: String,
        /// Extra detail, such as how to fix the problem.
        details: String,
    },
    /// A request failed.
    Error {
        /// The summary shown in bold.
        message: String,
        /// Extra detail, such as how to fix the problem.
        details: String,
    },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details, container_style, role) = match self {
            Alert::Warning { message, details } => (
                message,
                details,
                "p-4 mb-4 text-sm rounded-lg border text-yellow-800 \
                border-yellow-300 bg-yellow-50 dark:bg-gray-800 \
                dark:text-yellow-300 dark:border-yellow-800",
                "status",
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "p-4 mb-4 text-sm rounded-lg border text-red-800 \
                border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 \
                dark:border-red-800",
                "alert",
            ),
        };

        html! {
            div class=(container_style) role=(role)
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        span class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="font-bold"
                        onclick="this.closest('[role]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}
