//! # Search Filters
//!
//! Canonical, fully-populated search-parameter record derived from a
//! request's query string.
//!
//! Every field has a total default; [`parse_filters`] never fails and never
//! produces a partially-filled record. The inverse, [`to_search_params`],
//! emits only fields that differ from their default so that URLs stay
//! compact and canonical.
//!
//! # Examples
//!
//! ```
//! use servidir::domain::filters::{parse_filters, Filters};
//!
//! let pairs = vec![("q".to_string(), "corte".to_string())];
//! let filters = parse_filters(&pairs);
//! assert_eq!(filters.q, "corte");
//! assert_eq!(filters.page, 1);
//! ```

mod parse;

pub use parse::{parse_filters, to_search_params};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allowed page sizes for search results.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [25, 50, 100, 200];

/// Default country filter (ISO 3166-1 alpha-2).
pub const DEFAULT_COUNTRY: &str = "ES";

/// Default upper price bound in whole currency units.
pub const DEFAULT_MAX_PRICE: u32 = 250;

/// Default upper duration bound in minutes.
pub const DEFAULT_MAX_DURATION: u32 = 240;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Business name then service name, ascending.
    #[default]
    Relevance,
    /// Price ascending, nulls last.
    PriceAsc,
    /// Price descending, nulls last.
    PriceDesc,
    /// Duration ascending, nulls last.
    DurationAsc,
    /// Duration descending, nulls last.
    DurationDesc,
}

impl SortKey {
    /// Returns the query-string token for this sort key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::DurationAsc => "duration_asc",
            Self::DurationDesc => "duration_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "duration_asc" => Ok(Self::DurationAsc),
            "duration_desc" => Ok(Self::DurationDesc),
            _ => Err(()),
        }
    }
}

/// Presentation mode for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Card grid.
    #[default]
    Cards,
    /// Flat table.
    Table,
}

impl ViewMode {
    /// Returns the query-string token for this view mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cards => "cards",
            Self::Table => "table",
        }
    }
}

impl FromStr for ViewMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cards" => Ok(Self::Cards),
            "table" => Ok(Self::Table),
            _ => Err(()),
        }
    }
}

/// Aggregation scope for card view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardScope {
    /// One card per business, services collapsed.
    #[default]
    Businesses,
    /// One card per service row.
    Services,
}

impl CardScope {
    /// Returns the query-string token for this scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Businesses => "businesses",
            Self::Services => "services",
        }
    }
}

impl FromStr for CardScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "businesses" => Ok(Self::Businesses),
            "services" => Ok(Self::Services),
            _ => Err(()),
        }
    }
}

/// Canonical search filter record.
///
/// Constructed per request by [`parse_filters`] and discarded after the
/// response is rendered. Field order is the canonical serialization order
/// used by the query fingerprint, so do not reorder fields casually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Free-text search over business and service names.
    pub q: String,
    /// Whether advanced filters incur extra credit cost.
    pub advanced_mode: bool,
    /// Charge-and-search even with no active filters.
    pub show_all: bool,
    /// Exact service id.
    pub service_id: String,
    /// Exact business id.
    pub business_id: String,
    /// Service name substring.
    pub service_name: String,
    /// Business name substring.
    pub business_name: String,
    /// ISO 4217 currency code, uppercased.
    pub currency_code: String,
    /// Business phone substring.
    pub phone: String,
    /// Exact duration in minutes; overrides the duration range.
    pub duration_exact: Option<u32>,
    /// ISO 3166-1 alpha-2 country code, uppercased.
    pub country: String,
    /// City substring.
    pub city: String,
    /// Region substring.
    pub region: String,
    /// Business type codes (multi-select).
    pub business_types: Vec<String>,
    /// Service category codes (multi-select).
    pub categories: Vec<String>,
    /// Price kind codes (multi-select).
    pub price_kinds: Vec<String>,
    /// Lower price bound in whole currency units.
    pub min_price: Option<u32>,
    /// Upper price bound in whole currency units.
    pub max_price: Option<u32>,
    /// Lower duration bound in minutes.
    pub min_duration: Option<u32>,
    /// Upper duration bound in minutes.
    pub max_duration: Option<u32>,
    /// Sort order.
    pub sort: SortKey,
    /// 1-indexed page.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Presentation mode.
    pub view: ViewMode,
    /// Aggregation scope.
    pub scope: CardScope,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            q: String::new(),
            advanced_mode: false,
            show_all: false,
            service_id: String::new(),
            business_id: String::new(),
            service_name: String::new(),
            business_name: String::new(),
            currency_code: String::new(),
            phone: String::new(),
            duration_exact: None,
            country: DEFAULT_COUNTRY.to_string(),
            city: String::new(),
            region: String::new(),
            business_types: Vec::new(),
            categories: Vec::new(),
            price_kinds: Vec::new(),
            min_price: None,
            max_price: Some(DEFAULT_MAX_PRICE),
            min_duration: None,
            max_duration: Some(DEFAULT_MAX_DURATION),
            sort: SortKey::Relevance,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            view: ViewMode::Cards,
            scope: CardScope::Businesses,
        }
    }
}
