//! # servidir
//!
//! Credit-metered directory search service: a JSON API over a PostgREST
//! data source, with session auth through a GoTrue-style provider and
//! subscription billing through Stripe.
//!
//! Layered as domain (filters, catalog model, credits, billing), application
//! (search costing, aggregation, catalog orchestration, webhook sync),
//! infrastructure (remote clients and configuration) and the REST API.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
