//! # Remote Call Errors
//!
//! Error types for calls to the remote collaborators: the PostgREST data
//! source, the auth provider and the payments provider.
//!
//! None of these errors is retried anywhere in the system; they are either
//! absorbed into a safe default at the call site or surfaced as a generic
//! 500 at the route boundary.
//!
//! # Examples
//!
//! ```
//! use servidir::infrastructure::error::RemoteError;
//!
//! let error = RemoteError::timeout("request timed out after 10s");
//! assert!(error.to_string().contains("timed out"));
//! ```

use thiserror::Error;

/// Error type for remote service calls.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Request timed out.
    #[error("remote timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Network or connection error.
    #[error("remote connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Authentication or authorization failure against the remote service.
    #[error("remote authentication error: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// The remote service rejected the request (4xx).
    #[error("remote rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The remote service failed (5xx).
    #[error("remote service error ({status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Response could not be decoded.
    #[error("remote protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// Client construction or configuration problem.
    #[error("remote configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl RemoteError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classifies a failed HTTP response by status code.
    #[must_use]
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            401 | 403 => Self::Authentication { message },
            400..=499 => Self::Rejected { status, message },
            _ => Self::Service { status, message },
        }
    }

    /// Maps a transport error from reqwest.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_decode() {
            Self::protocol(error.to_string())
        } else {
            Self::connection(error.to_string())
        }
    }

    /// Returns true when the remote denied our credentials.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_maps_to_authentication() {
        let err = RemoteError::from_status(401, "bad key");
        assert!(err.is_authentication());
    }

    #[test]
    fn status_404_maps_to_rejected() {
        let err = RemoteError::from_status(404, "missing");
        assert!(matches!(err, RemoteError::Rejected { status: 404, .. }));
    }

    #[test]
    fn status_503_maps_to_service() {
        let err = RemoteError::from_status(503, "down");
        assert!(matches!(err, RemoteError::Service { status: 503, .. }));
        assert!(err.to_string().contains("503"));
    }
}
