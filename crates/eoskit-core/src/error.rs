//! Error types for core primitives.

use thiserror::Error;

/// Errors raised when constructing a chain [`Name`](crate::Name).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name '{name}' is longer than 13 characters")]
    TooLong { name: String },

    #[error("name '{name}' contains invalid character '{ch}'")]
    InvalidCharacter { name: String, ch: char },

    #[error("name '{name}' may not begin or end with a period")]
    EdgePeriod { name: String },

    #[error("name '{name}' may not contain consecutive periods")]
    DoublePeriod { name: String },

    #[error("name '{name}': 13th character '{ch}' is outside the [.1-5a-j] subset")]
    InvalidThirteenth { name: String, ch: char },
}
