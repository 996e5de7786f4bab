//! # Search Query Builder
//!
//! Translates a [`Filters`] record into PostgREST query parameters: filter
//! predicates, sort order and a row range for pagination.
//!
//! Raw tokens are sanitized before interpolation: commas and parentheses are
//! predicate-list delimiters in the PostgREST filter grammar, so leaving
//! them in a token would change the meaning of the predicate, not just its
//! hygiene.
//!
//! # Examples
//!
//! ```
//! use servidir::domain::filters::Filters;
//! use servidir::infrastructure::postgrest::query::{SearchQuery, SELECT_FIELDS_FULL};
//!
//! let filters = Filters { q: "corte".to_string(), ..Filters::default() };
//! let query = SearchQuery::for_filters(&filters, SELECT_FIELDS_FULL);
//! assert!(query.params().iter().any(|(k, _)| k == "or"));
//! ```

use crate::domain::filters::{Filters, SortKey};

/// Full projection of the service search view.
pub const SELECT_FIELDS_FULL: &str = "service_id,business_id,business_name,business_type_code,\
business_type_label,country_code,region,city,service_name,service_category_code,\
service_category_label,price_kind,currency_code,price_cents,price_min_cents,price_max_cents,\
duration_minutes";

/// Lighter projection used for business-card aggregation.
pub const SELECT_FIELDS_BUSINESS_LIGHT: &str = "business_id,business_name,business_type_label,\
country_code,region,city,service_name,service_category_code,service_category_label,price_kind,\
currency_code,price_cents,price_min_cents,price_max_cents,duration_minutes";

/// Ordered PostgREST query parameters for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    params: Vec<(String, String)>,
}

impl SearchQuery {
    /// Builds the query for a filter record against the search view.
    ///
    /// Each active filter maps to exactly one predicate; an exact-duration
    /// filter overrides the duration range with a single equality predicate.
    #[must_use]
    pub fn for_filters(filters: &Filters, select: &str) -> Self {
        let mut params: Vec<(String, String)> = vec![
            ("select".to_string(), select.to_string()),
            ("order".to_string(), sort_order(filters.sort).to_string()),
        ];

        if !filters.q.trim().is_empty() {
            let q = clean_token(&filters.q);
            params.push((
                "or".to_string(),
                format!("(business_name.ilike.*{q}*,service_name.ilike.*{q}*)"),
            ));
        }

        push_ilike(&mut params, "business_name", &filters.business_name);
        push_ilike(&mut params, "service_name", &filters.service_name);
        push_eq(&mut params, "business_id", &filters.business_id);
        push_eq(&mut params, "service_id", &filters.service_id);
        push_eq(
            &mut params,
            "currency_code",
            &filters.currency_code.to_uppercase(),
        );

        if !filters.country.trim().is_empty() {
            params.push((
                "country_code".to_string(),
                format!("eq.{}", filters.country.trim().to_uppercase()),
            ));
        }
        push_ilike(&mut params, "city", &filters.city);
        push_ilike(&mut params, "region", &filters.region);

        push_in(&mut params, "business_type_code", &filters.business_types);
        push_in(&mut params, "service_category_code", &filters.categories);
        push_in(&mut params, "price_kind", &filters.price_kinds);

        if let Some(price) = filters.min_price {
            params.push((
                "price_cents".to_string(),
                format!("gte.{}", i64::from(price) * 100),
            ));
        }
        if let Some(price) = filters.max_price {
            params.push((
                "price_cents".to_string(),
                format!("lte.{}", i64::from(price) * 100),
            ));
        }

        if let Some(minutes) = filters.duration_exact {
            // Exact duration overrides the range bounds.
            params.push(("duration_minutes".to_string(), format!("eq.{minutes}")));
        } else {
            if let Some(minutes) = filters.min_duration {
                params.push(("duration_minutes".to_string(), format!("gte.{minutes}")));
            }
            if let Some(minutes) = filters.max_duration {
                params.push(("duration_minutes".to_string(), format!("lte.{minutes}")));
            }
        }

        Self { params }
    }

    /// Point lookup of one service row by id.
    #[must_use]
    pub fn by_service_id(service_id: &str) -> Self {
        Self {
            params: vec![
                ("select".to_string(), SELECT_FIELDS_FULL.to_string()),
                (
                    "service_id".to_string(),
                    format!("eq.{}", clean_token(service_id)),
                ),
                ("limit".to_string(), "1".to_string()),
            ],
        }
    }

    /// All service rows of one business, sorted by service name.
    #[must_use]
    pub fn by_business_id(business_id: &str) -> Self {
        Self {
            params: vec![
                ("select".to_string(), SELECT_FIELDS_FULL.to_string()),
                (
                    "business_id".to_string(),
                    format!("eq.{}", clean_token(business_id)),
                ),
                ("order".to_string(), "service_name.asc".to_string()),
            ],
        }
    }

    /// The ordered query parameters.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

fn push_eq(params: &mut Vec<(String, String)>, column: &str, value: &str) {
    if !value.trim().is_empty() {
        params.push((column.to_string(), format!("eq.{}", clean_token(value))));
    }
}

fn push_ilike(params: &mut Vec<(String, String)>, column: &str, value: &str) {
    if !value.trim().is_empty() {
        params.push((
            column.to_string(),
            format!("ilike.*{}*", clean_token(value)),
        ));
    }
}

fn push_in(params: &mut Vec<(String, String)>, column: &str, tokens: &[String]) {
    if !tokens.is_empty() {
        let list = tokens
            .iter()
            .map(|token| clean_token(token))
            .collect::<Vec<_>>()
            .join(",");
        params.push((column.to_string(), format!("in.({list})")));
    }
}

/// Strips predicate-delimiter characters from a raw token.
#[must_use]
pub fn clean_token(value: &str) -> String {
    value
        .trim()
        .replace([',', '(', ')'], " ")
        .trim()
        .to_string()
}

/// Remote multi-column order expression for a sort key.
#[must_use]
pub const fn sort_order(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Relevance => "business_name.asc,service_name.asc",
        SortKey::PriceAsc => "price_cents.asc.nullslast,service_name.asc",
        SortKey::PriceDesc => "price_cents.desc.nullslast,service_name.asc",
        SortKey::DurationAsc => "duration_minutes.asc.nullslast,service_name.asc",
        SortKey::DurationDesc => "duration_minutes.desc.nullslast,service_name.asc",
    }
}

/// Inclusive row range for PostgREST range pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First row index, 0-based.
    pub from: u64,
    /// Last row index, inclusive.
    pub to: u64,
}

impl RowRange {
    /// Computes the row range for a 1-indexed page.
    #[must_use]
    pub fn for_page(page: u32, page_size: u32) -> Self {
        let from = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let to = from + u64::from(page_size).saturating_sub(1);
        Self { from, to }
    }

    /// Formats the `Range` header value (`items` range unit).
    #[must_use]
    pub fn header_value(self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}
