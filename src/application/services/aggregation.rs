//! # Business Aggregation
//!
//! Collapses flat service rows into business-level summary cards, entirely
//! in memory. Rows must arrive already filtered and sorted by the remote
//! source but NOT paginated: a business with N services collapses to one
//! card, so pagination only makes sense after aggregation.

use crate::domain::catalog::{BusinessCard, BusinessSummary, ServiceItem};

/// Fallback display name for rows without a business name.
const UNNAMED_BUSINESS: &str = "Negocio sin nombre";

/// Groups service rows into business cards.
///
/// Grouping key is (business id, business name) in first-seen order; rows
/// without a business id get a synthetic per-row key so they never merge.
/// Each group accumulates its service count, unseen category labels in
/// first-seen order, and min/max effective price. The final ordering is
/// descending by service count with ties left in first-seen order.
#[must_use]
pub fn build_business_cards(rows: &[ServiceItem]) -> Vec<BusinessCard> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, BusinessCard> =
        std::collections::HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let business_id = row
            .business_id
            .clone()
            .unwrap_or_else(|| format!("business-{idx}"));
        let business_name = row
            .business_name
            .clone()
            .unwrap_or_else(|| UNNAMED_BUSINESS.to_string());
        let key = format!("{business_id}|{business_name}");

        let card = grouped.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            BusinessCard {
                business_id: row.business_id.clone(),
                business_name,
                business_type_label: row
                    .business_type_label
                    .clone()
                    .or_else(|| row.business_type_code.clone())
                    .unwrap_or_else(|| "-".to_string()),
                country_code: row.country_code.clone(),
                region: row.region.clone(),
                city: row.city.clone(),
                service_count: 0,
                min_price_cents: None,
                max_price_cents: None,
                categories: Vec::new(),
            }
        });

        card.service_count += 1;

        if let Some(category) = row
            .service_category_label
            .clone()
            .or_else(|| row.service_category_code.clone())
            && !card.categories.contains(&category)
        {
            card.categories.push(category);
        }

        if let Some(price) = row.effective_price_cents() {
            card.min_price_cents = Some(card.min_price_cents.map_or(price, |m| m.min(price)));
            card.max_price_cents = Some(card.max_price_cents.map_or(price, |m| m.max(price)));
        }
    }

    let mut cards: Vec<BusinessCard> = order
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .collect();
    // Stable sort keeps first-seen order among ties.
    cards.sort_by(|a, b| b.service_count.cmp(&a.service_count));
    cards
}

/// Flattens the first card of a row set into the detail summary.
///
/// Returns `None` when there are no rows.
#[must_use]
pub fn build_business_summary(rows: &[ServiceItem]) -> Option<BusinessSummary> {
    let card = build_business_cards(rows).into_iter().next()?;
    let first = rows.first()?;
    Some(BusinessSummary {
        business_id: card.business_id,
        business_name: card.business_name,
        business_type_label: card.business_type_label,
        business_type_code: first.business_type_code.clone(),
        country_code: first.country_code.clone(),
        region: first.region.clone(),
        city: first.city.clone(),
        service_count: card.service_count,
        categories: card.categories,
        min_price_cents: card.min_price_cents,
        max_price_cents: card.max_price_cents,
    })
}
