//! # Catalog Model
//!
//! Rows of the remote search view and the aggregates derived from them.
//!
//! [`ServiceItem`] mirrors one row of the `v_service_search` view; every
//! attribute is nullable at the source, so every field is an `Option`.
//! [`BusinessCard`] is the business-level aggregate built in memory by the
//! aggregation service. Nothing here is persisted locally.

use serde::{Deserialize, Serialize};

/// One row of the remote service search view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Service identifier.
    pub service_id: Option<String>,
    /// Business identifier.
    pub business_id: Option<String>,
    /// Business display name.
    pub business_name: Option<String>,
    /// Business type code.
    pub business_type_code: Option<String>,
    /// Business type display label.
    pub business_type_label: Option<String>,
    /// ISO country code.
    pub country_code: Option<String>,
    /// Region name.
    pub region: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Service display name.
    pub service_name: Option<String>,
    /// Service category code.
    pub service_category_code: Option<String>,
    /// Service category display label.
    pub service_category_label: Option<String>,
    /// Pricing kind code (fixed, from, range, quote).
    pub price_kind: Option<String>,
    /// ISO currency code.
    pub currency_code: Option<String>,
    /// Fixed price in cents.
    pub price_cents: Option<i64>,
    /// Lower price bound in cents.
    pub price_min_cents: Option<i64>,
    /// Upper price bound in cents.
    pub price_max_cents: Option<i64>,
    /// Service duration in minutes.
    pub duration_minutes: Option<i64>,
}

impl ServiceItem {
    /// Effective price for min/max accumulation: the fixed price, else the
    /// range lower bound, else the range upper bound, else unknown.
    #[must_use]
    pub fn effective_price_cents(&self) -> Option<i64> {
        self.price_cents
            .or(self.price_min_cents)
            .or(self.price_max_cents)
    }
}

/// Business-level summary card aggregated from many service rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCard {
    /// Business identifier; `None` when the source row had none.
    pub business_id: Option<String>,
    /// Business display name (fallback label when the source had none).
    pub business_name: String,
    /// Business type display label.
    pub business_type_label: String,
    /// ISO country code.
    pub country_code: Option<String>,
    /// Region name.
    pub region: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Number of service rows collapsed into this card.
    pub service_count: u32,
    /// Cheapest effective price seen; `None` until a priced service is seen.
    pub min_price_cents: Option<i64>,
    /// Highest effective price seen; `None` until a priced service is seen.
    pub max_price_cents: Option<i64>,
    /// Deduplicated category labels in first-seen order.
    pub categories: Vec<String>,
}

/// One page of search results, services or business cards depending on scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult {
    /// Total matching rows (or cards) before pagination.
    pub total: u64,
    /// Total pages, at least 1.
    pub total_pages: u64,
    /// 1-indexed page this result covers.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Service rows (empty when scope is businesses).
    pub services: Vec<ServiceItem>,
    /// Business cards (empty when scope is services).
    pub businesses: Vec<BusinessCard>,
}

/// A code/label pair from a reference taxonomy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    /// Stable code.
    pub code: String,
    /// Display label.
    pub label: String,
}

/// Reference taxonomies used to populate filter controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    /// Business type options.
    pub business_types: Vec<ReferenceOption>,
    /// Service category options.
    pub service_categories: Vec<ReferenceOption>,
}

/// Business detail: the aggregate card plus source attributes and services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetail {
    /// Aggregated business summary.
    pub business: BusinessSummary,
    /// All services of the business, sorted by service name.
    pub services: Vec<ServiceItem>,
}

/// Flattened summary for the business detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSummary {
    /// Business identifier.
    pub business_id: Option<String>,
    /// Business display name.
    pub business_name: String,
    /// Business type display label.
    pub business_type_label: String,
    /// Business type code from the first service row.
    pub business_type_code: Option<String>,
    /// ISO country code.
    pub country_code: Option<String>,
    /// Region name.
    pub region: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Number of services.
    pub service_count: u32,
    /// Deduplicated category labels.
    pub categories: Vec<String>,
    /// Cheapest effective price.
    pub min_price_cents: Option<i64>,
    /// Highest effective price.
    pub max_price_cents: Option<i64>,
}
