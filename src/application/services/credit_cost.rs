//! # Search Credit Cost
//!
//! Pure cost model for one search: a base credit plus one credit per active
//! advanced filter, charged only when advanced mode is on. Each advanced
//! field counts at most once no matter how "active" it is.

use crate::domain::filters::{DEFAULT_COUNTRY, DEFAULT_MAX_DURATION, DEFAULT_MAX_PRICE, Filters};

/// Base cost of any charged search.
const BASE_COST: u32 = 1;

/// Counts advanced fields set to a non-default value.
///
/// Advanced fields: service id, business id, service name, business name,
/// currency code, phone, exact duration, price kinds, region, minimum
/// duration, and a maximum duration moved off its default.
#[must_use]
pub fn count_active_advanced_filters(filters: &Filters) -> u32 {
    let mut count = 0;
    if !filters.service_id.trim().is_empty() {
        count += 1;
    }
    if !filters.business_id.trim().is_empty() {
        count += 1;
    }
    if !filters.service_name.trim().is_empty() {
        count += 1;
    }
    if !filters.business_name.trim().is_empty() {
        count += 1;
    }
    if !filters.currency_code.trim().is_empty() {
        count += 1;
    }
    if !filters.phone.trim().is_empty() {
        count += 1;
    }
    if filters.duration_exact.is_some() {
        count += 1;
    }
    if !filters.price_kinds.is_empty() {
        count += 1;
    }
    if !filters.region.trim().is_empty() {
        count += 1;
    }
    if filters.min_duration.is_some() {
        count += 1;
    }
    if filters.max_duration != Some(DEFAULT_MAX_DURATION) {
        count += 1;
    }
    count
}

/// Credit cost of one search for a filter record.
///
/// Always at least 1; deterministic; no side effects. The advanced
/// surcharge applies only while advanced mode is switched on.
#[must_use]
pub fn search_credit_cost(filters: &Filters) -> u32 {
    let advanced = if filters.advanced_mode {
        count_active_advanced_filters(filters)
    } else {
        0
    };
    BASE_COST + advanced
}

/// Whether any filter differs from its default.
///
/// Drives the charge policy: searches with no active filter are free unless
/// the caller set the explicit show-all override.
#[must_use]
pub fn has_active_filters(filters: &Filters) -> bool {
    !filters.q.trim().is_empty()
        || !filters.service_id.trim().is_empty()
        || !filters.business_id.trim().is_empty()
        || !filters.service_name.trim().is_empty()
        || !filters.business_name.trim().is_empty()
        || !filters.currency_code.trim().is_empty()
        || !filters.phone.trim().is_empty()
        || filters.duration_exact.is_some()
        || !filters.city.trim().is_empty()
        || !filters.region.trim().is_empty()
        || filters.country != DEFAULT_COUNTRY
        || !filters.business_types.is_empty()
        || !filters.categories.is_empty()
        || !filters.price_kinds.is_empty()
        || filters.min_price.is_some()
        || filters.max_price != Some(DEFAULT_MAX_PRICE)
        || filters.min_duration.is_some()
        || filters.max_duration != Some(DEFAULT_MAX_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_is_one_when_advanced_mode_is_off() {
        let filters = Filters {
            advanced_mode: false,
            service_id: "svc-1".to_string(),
            business_id: "biz-1".to_string(),
            region: "Andalucia".to_string(),
            duration_exact: Some(30),
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&filters), 1);
    }

    #[test]
    fn cost_is_one_plus_k_for_k_active_advanced_fields() {
        let filters = Filters {
            advanced_mode: true,
            service_id: "svc-1".to_string(),
            currency_code: "EUR".to_string(),
            price_kinds: vec!["fixed".to_string()],
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&filters), 1 + 3);
    }

    #[test]
    fn each_advanced_field_counts_at_most_once() {
        // A long multi-token price kind set is still a single field.
        let filters = Filters {
            advanced_mode: true,
            price_kinds: vec![
                "fixed".to_string(),
                "from".to_string(),
                "range".to_string(),
            ],
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&filters), 2);
    }

    #[test]
    fn max_duration_counts_only_off_its_default() {
        let on_default = Filters {
            advanced_mode: true,
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&on_default), 1);

        let moved = Filters {
            advanced_mode: true,
            max_duration: Some(120),
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&moved), 2);

        let cleared = Filters {
            advanced_mode: true,
            max_duration: None,
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&cleared), 2);
    }

    #[test]
    fn whitespace_only_fields_are_not_active() {
        let filters = Filters {
            advanced_mode: true,
            service_name: "   ".to_string(),
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&filters), 1);
    }

    #[test]
    fn non_advanced_fields_never_add_cost() {
        let filters = Filters {
            advanced_mode: true,
            q: "corte".to_string(),
            city: "Madrid".to_string(),
            categories: vec!["hair".to_string()],
            ..Filters::default()
        };
        assert_eq!(search_credit_cost(&filters), 1);
    }

    #[test]
    fn default_record_has_no_active_filters() {
        assert!(!has_active_filters(&Filters::default()));
    }

    #[test]
    fn any_single_change_activates_the_record() {
        for filters in [
            Filters {
                q: "x".to_string(),
                ..Filters::default()
            },
            Filters {
                country: "PT".to_string(),
                ..Filters::default()
            },
            Filters {
                max_price: None,
                ..Filters::default()
            },
            Filters {
                min_duration: Some(15),
                ..Filters::default()
            },
            Filters {
                business_types: vec!["salon".to_string()],
                ..Filters::default()
            },
        ] {
            assert!(has_active_filters(&filters), "{filters:?}");
        }
    }

    #[test]
    fn paging_and_presentation_do_not_activate() {
        let filters = Filters {
            page: 7,
            page_size: 100,
            ..Filters::default()
        };
        assert!(!has_active_filters(&filters));
    }
}
