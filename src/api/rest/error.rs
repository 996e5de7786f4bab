//! Application-to-HTTP error mapping.
//!
//! Upstream failures are logged with detail and answered with a generic
//! 500; the insufficient-credits case is a 402 that carries the current
//! credit status so clients can render remaining balance.

use crate::application::error::ApplicationError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error wrapper for route handlers.
#[derive(Debug)]
pub struct ApiError(pub ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ApplicationError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),

            ApplicationError::InsufficientCredits(status) => (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({
                    "error": "insufficient_credits",
                    "credits": status,
                })),
            )
                .into_response(),

            ApplicationError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "resource": resource,
                    "id": id,
                })),
            )
                .into_response(),

            ApplicationError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "validation", "message": message })),
            )
                .into_response(),

            ApplicationError::InvalidSignature(message) => {
                tracing::warn!(%message, "webhook signature rejected");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_signature" })),
                )
                    .into_response()
            }

            ApplicationError::Domain(error) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "validation", "message": error.to_string() })),
            )
                .into_response(),

            error @ (ApplicationError::Remote(_)
            | ApplicationError::ResultSetTooLarge { .. }
            | ApplicationError::Internal(_)) => {
                tracing::error!(error = %error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal" })),
                )
                    .into_response()
            }
        }
    }
}
