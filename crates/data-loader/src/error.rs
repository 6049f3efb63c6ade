//! Error types for the data-loader crate.
//!
//! Input validation never aborts a run: the normalizers collect
//! `InputError`s next to the accepted values so the caller can report the
//! offending tokens and keep going with the rest.

use thiserror::Error;

/// Reasons a raw token or number set was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Token did not contain exactly five digit characters
    #[error("'{token}': expected 5 digits, found {found}")]
    DigitCount { token: String, found: usize },

    /// Token contained a digit outside the vocabulary (e.g. 7 in a tens pattern)
    #[error("'{token}': digit {digit} is outside {vocabulary} range 0-{max}")]
    DigitOutOfRange {
        token: String,
        digit: u8,
        vocabulary: &'static str,
        max: u8,
    },

    /// A final set did not contain exactly five numbers
    #[error("'{token}': expected 5 numbers, found {found}")]
    NumberCount { token: String, found: usize },

    /// A number fell outside 1..=69
    #[error("'{token}': number {number} is outside 1-69")]
    NumberOutOfRange { token: String, number: u32 },

    /// The same number appeared twice in one set
    #[error("'{token}': number {number} appears more than once")]
    DuplicateNumber { token: String, number: u8 },
}

impl InputError {
    /// The raw token that caused the rejection.
    pub fn token(&self) -> &str {
        match self {
            InputError::DigitCount { token, .. }
            | InputError::DigitOutOfRange { token, .. }
            | InputError::NumberCount { token, .. }
            | InputError::NumberOutOfRange { token, .. }
            | InputError::DuplicateNumber { token, .. } => token,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, InputError>;
