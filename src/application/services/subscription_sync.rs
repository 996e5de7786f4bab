//! # Subscription Synchronization
//!
//! Applies decoded payment-provider webhook events to the local
//! subscription mirror. Checkout completion establishes the customer-user
//! link; subscription lifecycle events only ever update a row that link
//! already created. An event for an unknown customer is skipped, not an
//! error, so the provider gets its 2xx and stops retrying.

use crate::application::error::ApplicationResult;
use crate::domain::billing::{PlanCode, SubscriptionRecord};
use crate::infrastructure::billing::webhook::{CheckoutPayload, SubscriptionPayload};
use crate::infrastructure::billing::{PlanPrices, SubscriptionStore, WebhookEvent};
use chrono::DateTime;
use std::sync::Arc;

/// What a webhook event did to the local mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A subscription row was written.
    Applied,
    /// Nothing to do for this event.
    Skipped,
}

/// Applies webhook events to the subscription store.
#[derive(Clone)]
pub struct SubscriptionSyncService {
    store: Arc<dyn SubscriptionStore>,
    plan_prices: PlanPrices,
}

impl SubscriptionSyncService {
    /// Creates the service over a store and the configured price mapping.
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>, plan_prices: PlanPrices) -> Self {
        Self { store, plan_prices }
    }

    /// Applies one decoded event.
    ///
    /// # Errors
    ///
    /// Returns an application error when the store fails; never for
    /// unknown customers or ignored event kinds.
    pub async fn apply(&self, event: WebhookEvent) -> ApplicationResult<SyncOutcome> {
        match event {
            WebhookEvent::CheckoutCompleted(checkout) => self.apply_checkout(checkout).await,
            WebhookEvent::SubscriptionUpserted(subscription) => {
                self.apply_upsert(subscription).await
            }
            WebhookEvent::SubscriptionDeleted(subscription) => {
                self.apply_delete(subscription).await
            }
            WebhookEvent::Ignored(kind) => {
                tracing::debug!(%kind, "ignoring webhook event");
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    async fn apply_checkout(&self, checkout: CheckoutPayload) -> ApplicationResult<SyncOutcome> {
        let Some(user_id) = checkout.client_reference_id else {
            tracing::warn!(customer = %checkout.customer, "checkout without user reference");
            return Ok(SyncOutcome::Skipped);
        };

        let mut record = self
            .store
            .by_user_id(&user_id)
            .await?
            .unwrap_or_else(|| SubscriptionRecord::stub(&user_id));
        record.stripe_customer_id = Some(checkout.customer);
        if checkout.subscription.is_some() {
            record.stripe_subscription_id = checkout.subscription;
        }
        if let Some(plan) = checkout.plan_code.as_deref().and_then(|p| p.parse().ok()) {
            record.plan_code = plan;
        }
        record.status = "active".to_string();

        self.store.upsert(&record).await?;
        tracing::info!(%user_id, plan = %record.plan_code, "checkout linked subscription");
        Ok(SyncOutcome::Applied)
    }

    async fn apply_upsert(
        &self,
        subscription: SubscriptionPayload,
    ) -> ApplicationResult<SyncOutcome> {
        let Some(mut record) = self.store.by_customer_id(&subscription.customer).await? else {
            tracing::warn!(
                customer = %subscription.customer,
                "subscription event for unlinked customer, skipping"
            );
            return Ok(SyncOutcome::Skipped);
        };

        record.stripe_subscription_id = Some(subscription.id);
        record.status = subscription.status;
        record.current_period_end = subscription.current_period_end.and_then(period_end_rfc3339);
        // A price outside the configured mapping grants nothing.
        record.plan_code = subscription
            .price_id
            .as_deref()
            .and_then(|price_id| self.plan_prices.plan_for(price_id))
            .unwrap_or(PlanCode::Free);
        record.stripe_price_id = subscription.price_id;

        self.store.upsert(&record).await?;
        Ok(SyncOutcome::Applied)
    }

    async fn apply_delete(
        &self,
        subscription: SubscriptionPayload,
    ) -> ApplicationResult<SyncOutcome> {
        let Some(mut record) = self.store.by_customer_id(&subscription.customer).await? else {
            tracing::warn!(
                customer = %subscription.customer,
                "cancellation for unlinked customer, skipping"
            );
            return Ok(SyncOutcome::Skipped);
        };

        record.status = "canceled".to_string();
        record.plan_code = PlanCode::Free;
        record.current_period_end = subscription.current_period_end.and_then(period_end_rfc3339);

        self.store.upsert(&record).await?;
        tracing::info!(user_id = %record.user_id, "subscription canceled");
        Ok(SyncOutcome::Applied)
    }
}

fn period_end_rfc3339(unix: i64) -> Option<String> {
    DateTime::from_timestamp(unix, 0).map(|ts| ts.to_rfc3339())
}
