//! Accounts, log-in sessions and the middleware that protects routes.

mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod session;
mod user;

pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx, auth_guard_json};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{get_register_page, register_user};
pub use session::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Session};
pub use user::{
    User, UserID, count_users, create_user, create_user_table, get_user_by_email,
    get_user_by_id, parse_email,
};
