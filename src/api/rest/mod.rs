//! # REST API
//!
//! HTTP surface of the directory service.
//!
//! # Endpoints
//!
//! ## Catalog
//! - `GET /api/v1/items` - Search services or aggregated business cards
//! - `GET /api/v1/items/{id}` - Get one service by id
//! - `GET /api/v1/businesses/{id}` - Get one business with all its services
//! - `GET /api/v1/reference` - Filter taxonomies (business types, categories)
//!
//! ## Credits and billing
//! - `GET /api/v1/credits` - Current credit status
//! - `POST /api/v1/billing/checkout` - Start a subscription checkout
//! - `POST /api/v1/billing/webhook` - Payment provider webhook sink
//!
//! ## Sessions
//! - `GET /auth/callback` - Sign-in code/OTP exchange, sets session cookies
//! - `POST /auth/logout` - Clear the session
//! - `POST /api/v1/dev/auth/magic-link` - Dev-only magic link (404 in prod)
//!
//! ## Health
//! - `GET /api/v1/health` - Liveness check

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use handlers::{
    AppState, CheckoutRequest, HealthResponse, ItemsResponse, MagicLinkRequest,
};
pub use routes::create_router;
