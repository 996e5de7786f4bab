//! # Domain Errors
//!
//! Error types for domain-level validation.
//!
//! Filter parsing is all-or-nothing: the route layer never surfaces these
//! errors to callers, it falls back to [`Filters::default`] instead. The
//! variants exist so individual field validators can report what went wrong
//! and so tests can assert on the failure mode.
//!
//! [`Filters::default`]: crate::domain::filters::Filters

use thiserror::Error;

/// Error type for domain validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A filter field failed validation.
    #[error("invalid filter field `{field}`: {message}")]
    InvalidFilterField {
        /// Query-string key that failed.
        field: &'static str,
        /// Reason the value was rejected.
        message: String,
    },

    /// A plan code was not recognized.
    #[error("unknown plan code: {0}")]
    UnknownPlan(String),
}

impl DomainError {
    /// Creates an invalid filter field error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFilterField {
            field,
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
