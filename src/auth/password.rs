//! Password strength checks and hashing.
//!
//! A raw password becomes a [ValidatedPassword] once it passes the strength
//! check, and a [PasswordHash] once it has been salted and hashed for storage.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that is strong enough to use, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are strings the user has also typed, such as their email
    /// address, so that passwords derived from them are penalised.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with suggestions for a stronger password if
    /// the estimated strength is below [Score::Three].
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let estimate = zxcvbn(raw_password, user_inputs);

        if estimate.score() >= Score::Three {
            return Ok(Self(raw_password.to_owned()));
        }

        let feedback = estimate
            .feedback()
            .map(Feedback::to_string)
            .filter(|feedback| !feedback.is_empty())
            .unwrap_or_else(|| "Use a longer password with fewer common words.".to_owned());

        Err(Error::TooWeak(feedback))
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Only for tests and tooling where a known weak password is wanted.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with bcrypt using `cost` rounds.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails, e.g. for an out of range `cost`.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash that was read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check that `raw_password` matches the stored password.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
