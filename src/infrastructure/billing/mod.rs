//! # Billing Infrastructure
//!
//! Payments provider client, webhook verification and the subscription
//! record store, plus the configured mapping between plan codes and the
//! provider's price ids.

pub mod stripe;
pub mod subscriptions;
pub mod webhook;

pub use stripe::{BillingProvider, CheckoutSessionRequest, StripeBillingClient};
pub use subscriptions::{PostgrestSubscriptionStore, SubscriptionStore};
pub use webhook::{
    SIGNATURE_TOLERANCE_SECS, WebhookError, WebhookEvent, decode_event, verify_signature,
};

use crate::domain::billing::PlanCode;

/// Configured mapping between purchasable plans and provider price ids.
#[derive(Debug, Clone, Default)]
pub struct PlanPrices {
    /// Price id for the starter tier.
    pub starter: String,
    /// Price id for the pro tier.
    pub pro: String,
    /// Price id for the agency tier.
    pub agency: String,
}

impl PlanPrices {
    /// Returns the price id for a plan, `None` for non-purchasable tiers.
    #[must_use]
    pub fn price_for(&self, plan: PlanCode) -> Option<&str> {
        match plan {
            PlanCode::Free => None,
            PlanCode::Starter => Some(self.starter.as_str()),
            PlanCode::Pro => Some(self.pro.as_str()),
            PlanCode::Agency => Some(self.agency.as_str()),
        }
    }

    /// Reverse lookup from a provider price id to a plan.
    #[must_use]
    pub fn plan_for(&self, price_id: &str) -> Option<PlanCode> {
        if price_id == self.starter {
            Some(PlanCode::Starter)
        } else if price_id == self.pro {
            Some(PlanCode::Pro)
        } else if price_id == self.agency {
            Some(PlanCode::Agency)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> PlanPrices {
        PlanPrices {
            starter: "price_starter".to_string(),
            pro: "price_pro".to_string(),
            agency: "price_agency".to_string(),
        }
    }

    #[test]
    fn free_has_no_price() {
        assert!(prices().price_for(PlanCode::Free).is_none());
        assert_eq!(prices().price_for(PlanCode::Pro), Some("price_pro"));
    }

    #[test]
    fn unknown_price_maps_to_no_plan() {
        assert_eq!(prices().plan_for("price_pro"), Some(PlanCode::Pro));
        assert_eq!(prices().plan_for("price_x"), None);
    }
}
