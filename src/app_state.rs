//! The state shared by every request handler.
//!
//! Handlers never take [AppState] directly. Each feature pulls the parts it
//! needs out of it with [FromRef], e.g. the dashboard only sees the database,
//! the timezone and the calendar settings.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::DEFAULT_COOKIE_DURATION, dashboard::CalendarConfig, db::initialize,
    timezone::get_local_offset,
};

/// Spendwise's server-wide state, fixed once the server has started.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts the session cookie.
    pub cookie_key: Key,
    /// How long a session lasts without a request before the user must log in again.
    pub cookie_duration: Duration,
    /// The timezone that decides which day a transaction falls on.
    pub local_timezone: String,
    pub calendar_config: CalendarConfig,
    /// The user, session and transaction tables.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Check the server settings and create the tables in `db_connection`
    /// if they are missing.
    ///
    /// The cookie key is derived from `cookie_secret`, so sessions survive a
    /// restart as long as the secret stays the same.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name,
    /// - [Error::InvalidCalendarConfig] if the calendar window bounds contradict each other,
    /// - [Error::SqlError] if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        calendar_config: CalendarConfig,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }
        calendar_config.validate()?;

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            calendar_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the session cookie key from `secret`.
///
/// The secret can be any length, it is stretched to the 64 bytes a [Key] needs.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::FromRef;
    use axum_extra::extract::cookie::Key;
    use rusqlite::Connection;

    use crate::{Error, auth::count_users, dashboard::CalendarConfig};

    use super::{AppState, create_cookie_key};

    fn new_state(timezone: &str, calendar_config: CalendarConfig) -> Result<AppState, Error> {
        AppState::new(
            Connection::open_in_memory().unwrap(),
            "hunter2",
            timezone,
            calendar_config,
        )
    }

    #[test]
    fn creates_tables() {
        let state = new_state("Pacific/Auckland", CalendarConfig::default()).unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_users(&connection), Ok(0));
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert_eq!(
            new_state("Mars/Olympus_Mons", CalendarConfig::default()).map(|_| ()),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }

    #[test]
    fn rejects_contradicting_calendar_windows() {
        let config = CalendarConfig {
            minimum_window_days: 400,
            maximum_window_days: 365,
            ..Default::default()
        };

        assert!(matches!(
            new_state("Etc/UTC", config),
            Err(Error::InvalidCalendarConfig {
                minimum_days: 400,
                maximum_days: 365
            })
        ));
    }

    #[test]
    fn cookie_key_depends_only_on_the_secret() {
        let state = new_state("Etc/UTC", CalendarConfig::default()).unwrap();

        assert_eq!(
            Key::from_ref(&state).master(),
            create_cookie_key("hunter2").master()
        );
        assert_ne!(
            create_cookie_key("hunter2").master(),
            create_cookie_key("hunter3").master()
        );
    }

    #[test]
    fn clones_share_the_connection() {
        let state = new_state("Etc/UTC", CalendarConfig::default()).unwrap();

        let clone = state.clone();

        assert!(Arc::ptr_eq(&state.db_connection, &clone.db_connection));
    }
}
