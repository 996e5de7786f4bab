//! Query-string parsing and serialization for [`Filters`].
//!
//! Parsing is all-or-nothing: each field is validated independently, but a
//! single rejected field invalidates the whole input and the hard-coded
//! default record is returned instead. No partial merge ever happens.
//!
//! Serialization is the canonical compaction: fields equal to their default
//! are omitted, so `parse(serialize(f)) == f` holds for any normalized `f`.

use super::{
    CardScope, DEFAULT_COUNTRY, DEFAULT_MAX_DURATION, DEFAULT_MAX_PRICE, Filters,
    PAGE_SIZE_OPTIONS, SortKey, ViewMode,
};
use crate::domain::errors::{DomainError, DomainResult};
use std::str::FromStr;

/// Parses raw query-string pairs into a fully-populated filter record.
///
/// Multi-valued keys are single-valued here: the first occurrence wins.
/// Unparseable input yields the full default record, never an error and
/// never a partially-filled record.
#[must_use]
pub fn parse_filters(pairs: &[(String, String)]) -> Filters {
    try_parse(pairs).unwrap_or_default()
}

/// Serializes a filter record back to query-string pairs.
///
/// Fields equal to their default are omitted. Fields whose default is a
/// concrete bound (`maxPrice`, `maxDuration`, `country`) serialize an empty
/// value when explicitly cleared, so the round trip through
/// [`parse_filters`] is lossless.
#[must_use]
pub fn to_search_params(filters: &Filters) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    let mut put = |key: &str, value: String| {
        params.push((key.to_string(), value));
    };

    if !filters.q.is_empty() {
        put("q", filters.q.clone());
    }
    if filters.advanced_mode {
        put("advancedMode", "1".to_string());
    }
    if filters.show_all {
        put("showAll", "1".to_string());
    }
    if !filters.service_id.is_empty() {
        put("serviceId", filters.service_id.clone());
    }
    if !filters.business_id.is_empty() {
        put("businessId", filters.business_id.clone());
    }
    if !filters.service_name.is_empty() {
        put("serviceName", filters.service_name.clone());
    }
    if !filters.business_name.is_empty() {
        put("businessName", filters.business_name.clone());
    }
    if !filters.currency_code.is_empty() {
        put("currencyCode", filters.currency_code.clone());
    }
    if !filters.phone.is_empty() {
        put("phone", filters.phone.clone());
    }
    if let Some(minutes) = filters.duration_exact {
        put("durationExact", minutes.to_string());
    }
    if filters.country != DEFAULT_COUNTRY {
        put("country", filters.country.clone());
    }
    if !filters.city.is_empty() {
        put("city", filters.city.clone());
    }
    if !filters.region.is_empty() {
        put("region", filters.region.clone());
    }
    if !filters.business_types.is_empty() {
        put("businessTypes", filters.business_types.join(","));
    }
    if !filters.categories.is_empty() {
        put("categories", filters.categories.join(","));
    }
    if !filters.price_kinds.is_empty() {
        put("priceKinds", filters.price_kinds.join(","));
    }
    if let Some(price) = filters.min_price {
        put("minPrice", price.to_string());
    }
    match filters.max_price {
        Some(price) if price == DEFAULT_MAX_PRICE => {}
        Some(price) => put("maxPrice", price.to_string()),
        None => put("maxPrice", String::new()),
    }
    if let Some(minutes) = filters.min_duration {
        put("minDuration", minutes.to_string());
    }
    match filters.max_duration {
        Some(minutes) if minutes == DEFAULT_MAX_DURATION => {}
        Some(minutes) => put("maxDuration", minutes.to_string()),
        None => put("maxDuration", String::new()),
    }
    if filters.sort != SortKey::Relevance {
        put("sort", filters.sort.as_str().to_string());
    }
    if filters.page != 1 {
        put("page", filters.page.to_string());
    }
    if filters.page_size != super::DEFAULT_PAGE_SIZE {
        put("pageSize", filters.page_size.to_string());
    }
    if filters.view != ViewMode::Cards {
        put("view", filters.view.as_str().to_string());
    }
    if filters.scope != CardScope::Businesses {
        put("scope", filters.scope.as_str().to_string());
    }

    params
}

fn try_parse(pairs: &[(String, String)]) -> DomainResult<Filters> {
    let defaults = Filters::default();

    let country = match text(pairs, "country", 2)? {
        Some(value) => value.to_uppercase(),
        None => defaults.country,
    };
    let currency_code = text(pairs, "currencyCode", 3)?
        .map(|value| value.to_uppercase())
        .unwrap_or_default();

    Ok(Filters {
        q: text(pairs, "q", 120)?.unwrap_or_default(),
        advanced_mode: flag(pairs, "advancedMode"),
        show_all: flag(pairs, "showAll"),
        service_id: text(pairs, "serviceId", 120)?.unwrap_or_default(),
        business_id: text(pairs, "businessId", 120)?.unwrap_or_default(),
        service_name: text(pairs, "serviceName", 120)?.unwrap_or_default(),
        business_name: text(pairs, "businessName", 120)?.unwrap_or_default(),
        currency_code,
        phone: text(pairs, "phone", 40)?.unwrap_or_default(),
        duration_exact: number(pairs, "durationExact")?.flatten(),
        country,
        city: text(pairs, "city", 80)?.unwrap_or_default(),
        region: text(pairs, "region", 80)?.unwrap_or_default(),
        business_types: csv(pairs, "businessTypes"),
        categories: csv(pairs, "categories"),
        price_kinds: csv(pairs, "priceKinds"),
        min_price: number(pairs, "minPrice")?.flatten(),
        max_price: match number(pairs, "maxPrice")? {
            Some(value) => value,
            None => defaults.max_price,
        },
        min_duration: number(pairs, "minDuration")?.flatten(),
        max_duration: match number(pairs, "maxDuration")? {
            Some(value) => value,
            None => defaults.max_duration,
        },
        sort: token(pairs, "sort")?.unwrap_or_default(),
        page: page(pairs)?,
        page_size: page_size(pairs)?,
        view: token(pairs, "view")?.unwrap_or_default(),
        scope: token(pairs, "scope")?.unwrap_or_default(),
    })
}

/// First occurrence of `key`, if any.
fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Trimmed, length-capped free-text field. `None` when the key is absent.
fn text(
    pairs: &[(String, String)],
    key: &'static str,
    cap: usize,
) -> DomainResult<Option<String>> {
    let Some(raw) = first(pairs, key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.chars().count() > cap {
        return Err(DomainError::invalid_field(
            key,
            format!("longer than {cap} characters"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Boolean flag: "1" or "true" (any case) is true, everything else false.
fn flag(pairs: &[(String, String)], key: &str) -> bool {
    match first(pairs, key) {
        Some(raw) => {
            let trimmed = raw.trim();
            trimmed == "1" || trimmed.eq_ignore_ascii_case("true")
        }
        None => false,
    }
}

/// Non-negative integer field. Outer `None` when absent, inner `None` when
/// the value is an empty string.
fn number(pairs: &[(String, String)], key: &'static str) -> DomainResult<Option<Option<u32>>> {
    let Some(raw) = first(pairs, key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Some(None));
    }
    let value = trimmed
        .parse::<u32>()
        .map_err(|_| DomainError::invalid_field(key, "not a non-negative integer"))?;
    Ok(Some(Some(value)))
}

/// Comma-separated set field: trimmed, non-empty tokens. Never fails.
fn csv(pairs: &[(String, String)], key: &str) -> Vec<String> {
    match first(pairs, key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Enum token field parsed via `FromStr`.
fn token<T: FromStr + Default>(
    pairs: &[(String, String)],
    key: &'static str,
) -> DomainResult<Option<T>> {
    let Some(raw) = first(pairs, key) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| DomainError::invalid_field(key, "unknown token"))
}

fn page(pairs: &[(String, String)]) -> DomainResult<u32> {
    match number(pairs, "page")?.flatten() {
        Some(0) => Err(DomainError::invalid_field("page", "must be positive")),
        Some(value) => Ok(value),
        None => Ok(1),
    }
}

fn page_size(pairs: &[(String, String)]) -> DomainResult<u32> {
    match number(pairs, "pageSize")?.flatten() {
        Some(value) if PAGE_SIZE_OPTIONS.contains(&value) => Ok(value),
        Some(_) => Err(DomainError::invalid_field(
            "pageSize",
            "not in the allowed set",
        )),
        None => Ok(super::DEFAULT_PAGE_SIZE),
    }
}
