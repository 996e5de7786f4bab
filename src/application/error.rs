//! # Application Errors
//!
//! Error types for use-case execution.
//!
//! The taxonomy mirrors how the route boundary answers: unauthenticated
//! access, insufficient credits (a 402-style result carrying the current
//! status, distinct from exceptional failures), not-found entities, and
//! upstream remote failures surfaced as a generic error after logging.
//! Nothing in here is ever retried.

use crate::domain::credits::UserCreditStatus;
use crate::domain::errors::DomainError;
use crate::infrastructure::error::RemoteError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain validation failure.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Remote collaborator failure.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// No authenticated user on a gated route.
    #[error("unauthorized")]
    Unauthorized,

    /// The remote ledger refused to debit credits.
    #[error("insufficient credits")]
    InsufficientCredits(Box<UserCreditStatus>),

    /// Resource not found.
    #[error("not found: {resource} with id {id}")]
    NotFound {
        /// Type of resource.
        resource: String,
        /// Resource identifier.
        id: String,
    },

    /// Webhook payload failed signature verification.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// A full-result-set fetch exceeded the hard row cap.
    #[error("result set too large: fetched {fetched} rows, cap is {cap}")]
    ResultSetTooLarge {
        /// Rows accumulated before aborting.
        fetched: u64,
        /// Hard cap.
        cap: u64,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates an insufficient-credits error carrying the ledger status.
    #[must_use]
    pub fn insufficient_credits(status: UserCreditStatus) -> Self {
        Self::InsufficientCredits(Box::new(status))
    }

    /// Creates an invalid-signature error.
    #[must_use]
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::InvalidSignature(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is an authentication failure of the caller.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_resource() {
        let err = ApplicationError::not_found("service", "svc-1");
        assert!(err.to_string().contains("service"));
        assert!(err.to_string().contains("svc-1"));
        assert!(err.is_not_found());
    }

    #[test]
    fn insufficient_credits_keeps_the_status() {
        let status = UserCreditStatus {
            ok: false,
            remaining_credits: Some(0),
            ..UserCreditStatus::default()
        };
        let err = ApplicationError::insufficient_credits(status);
        if let ApplicationError::InsufficientCredits(status) = err {
            assert_eq!(status.remaining_credits, Some(0));
        } else {
            unreachable!("wrong variant");
        }
    }

    #[test]
    fn remote_errors_convert() {
        let err: ApplicationError = RemoteError::timeout("slow").into();
        assert!(err.to_string().contains("slow"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn row_cap_error_reports_both_numbers() {
        let err = ApplicationError::ResultSetTooLarge {
            fetched: 50_100,
            cap: 50_000,
        };
        assert!(err.to_string().contains("50100"));
        assert!(err.to_string().contains("50000"));
    }
}
