//! # Application Services
//!
//! Use-case logic between the HTTP surface and the infrastructure clients:
//! search costing and fingerprinting, catalog queries with business
//! aggregation, and webhook-driven subscription synchronization.

pub mod aggregation;
pub mod catalog;
pub mod credit_cost;
pub mod fingerprint;
pub mod subscription_sync;

pub use aggregation::{build_business_cards, build_business_summary};
pub use catalog::{CatalogService, SearchGateway, ServicePage};
pub use credit_cost::{count_active_advanced_filters, has_active_filters, search_credit_cost};
pub use fingerprint::query_fingerprint;
pub use subscription_sync::{SubscriptionSyncService, SyncOutcome};
