//! The log-in session, stored as a private (signed and encrypted) cookie.
//!
//! A session is the only piece of process-wide client state. Its lifecycle is:
//! - [Session::start] at log-in writes the session cookie,
//! - [Session::restore] on every protected request reads it back,
//! - [Session::extend] slides the expiry forward while the user is active,
//! - [Session::end] at log-out overwrites the cookie with an expired one.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID};

/// The name of the cookie holding the serialised [Session].
pub const COOKIE_TOKEN: &str = "session";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

mod datetime_format {
    //! Serialises [time::OffsetDateTime] with two digit hours.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// An authenticated user's session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Session {
    pub user_id: UserID,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Create a session for `user_id` that expires `duration` from now.
    ///
    /// # Errors
    /// Returns [Error::CookieError] if the expiry overflows the date time range.
    pub fn new(user_id: UserID, duration: Duration, local_offset: UtcOffset) -> Result<Self, Error> {
        let expires_at = OffsetDateTime::now_utc()
            .to_offset(local_offset)
            .checked_add(duration)
            .ok_or_else(|| Error::CookieError(format!("cannot add {duration} to now")))?;

        Ok(Self {
            user_id,
            expires_at,
        })
    }

    /// Write the session cookie into `jar`.
    ///
    /// # Errors
    /// Returns [Error::CookieError] if the session cannot be serialised.
    pub fn start(self, jar: PrivateCookieJar) -> Result<PrivateCookieJar, Error> {
        let value =
            serde_json::to_string(&self).map_err(|error| Error::CookieError(error.to_string()))?;

        Ok(jar.add(
            Cookie::build((COOKIE_TOKEN, value))
                .expires(self.expires_at)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
    }

    /// Read the session back from the cookies in `jar`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::CookieMissing] if there is no session cookie,
    /// - [Error::CookieError] if the cookie cannot be parsed or the session has expired.
    pub fn restore(jar: &PrivateCookieJar) -> Result<Self, Error> {
        let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
        let session: Session = serde_json::from_str(cookie.value_trimmed())
            .map_err(|error| Error::CookieError(error.to_string()))?;

        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(Error::CookieError(format!(
                "session expired at {}",
                session.expires_at
            )));
        }

        Ok(session)
    }

    /// Push the session's expiry out to at least `duration` from now.
    ///
    /// Sessions that already expire later, e.g. "remember me" sessions, keep
    /// their expiry. The jar is not modified if an error is returned.
    ///
    /// # Errors
    /// Returns the errors of [Session::restore] and [Session::start].
    pub fn extend(
        jar: PrivateCookieJar,
        duration: Duration,
        local_offset: UtcOffset,
    ) -> Result<PrivateCookieJar, Error> {
        let session = Session::restore(&jar)?;
        let extended = Session::new(session.user_id, duration, local_offset)?;

        Session {
            user_id: session.user_id,
            expires_at: max(session.expires_at, extended.expires_at),
        }
        .start(jar)
    }

    /// Replace the session cookie with an expired placeholder, which deletes
    /// the cookie on the client side.
    pub fn end(jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.add(
            Cookie::build((COOKIE_TOKEN, "deleted"))
                .expires(OffsetDateTime::UNIX_EPOCH)
                .max_age(Duration::ZERO)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
    }
}
