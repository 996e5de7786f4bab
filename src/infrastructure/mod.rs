//! # Infrastructure Layer
//!
//! Clients for the remote collaborators (PostgREST data source, auth
//! provider, payments provider), configuration loading and the shared
//! remote error taxonomy. Application-layer ports are implemented here.

pub mod auth;
pub mod billing;
pub mod config;
pub mod credits;
pub mod error;
pub mod postgrest;
