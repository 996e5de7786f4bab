//! # Billing Model
//!
//! Plan codes and the local mirror of provider-owned subscription state.
//!
//! Subscription rows are synchronized one-way from payment-provider webhook
//! events; this application never invents billing state of its own.

use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCode {
    /// No paid subscription.
    #[default]
    Free,
    /// Entry paid tier.
    Starter,
    /// Mid paid tier.
    Pro,
    /// Top paid tier.
    Agency,
}

impl PlanCode {
    /// Returns the stable wire token for this plan.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Agency => "agency",
        }
    }

    /// Returns true for tiers that can be checked out.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl fmt::Display for PlanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            "agency" => Ok(Self::Agency),
            other => Err(DomainError::UnknownPlan(other.to_string())),
        }
    }
}

/// Local mirror of one provider subscription, keyed by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owning user.
    pub user_id: String,
    /// Payment-provider customer id.
    pub stripe_customer_id: Option<String>,
    /// Payment-provider subscription id.
    pub stripe_subscription_id: Option<String>,
    /// Payment-provider price id the subscription is on.
    pub stripe_price_id: Option<String>,
    /// Plan derived from the price id.
    pub plan_code: PlanCode,
    /// Provider-reported status (active, canceled, past_due, ...).
    pub status: String,
    /// End of the current billing period (RFC 3339).
    pub current_period_end: Option<String>,
}

impl SubscriptionRecord {
    /// A fresh row for a user with no provider state yet.
    #[must_use]
    pub fn stub(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_price_id: None,
            plan_code: PlanCode::Free,
            status: "inactive".to_string(),
            current_period_end: None,
        }
    }
}
