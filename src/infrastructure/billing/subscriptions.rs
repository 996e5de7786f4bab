//! Subscription record persistence over the PostgREST transport.

use crate::domain::billing::SubscriptionRecord;
use crate::infrastructure::error::RemoteResult;
use crate::infrastructure::postgrest::PostgrestClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Table holding one subscription row per user.
const SUBSCRIPTIONS_TABLE: &str = "billing_subscriptions";

/// Port to subscription record storage.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Looks a record up by application user id.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn by_user_id(&self, user_id: &str) -> RemoteResult<Option<SubscriptionRecord>>;

    /// Looks a record up by provider customer id.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn by_customer_id(&self, customer_id: &str) -> RemoteResult<Option<SubscriptionRecord>>;

    /// Inserts or replaces the record for its user.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport failure.
    async fn upsert(&self, record: &SubscriptionRecord) -> RemoteResult<()>;
}

/// [`SubscriptionStore`] backed by the PostgREST client.
#[derive(Clone)]
pub struct PostgrestSubscriptionStore {
    client: Arc<PostgrestClient>,
}

impl PostgrestSubscriptionStore {
    /// Creates a store over a shared PostgREST client.
    #[must_use]
    pub fn new(client: Arc<PostgrestClient>) -> Self {
        Self { client }
    }

    async fn find_one(&self, column: &str, value: &str) -> RemoteResult<Option<SubscriptionRecord>> {
        let params = vec![
            ("select".to_string(), "*".to_string()),
            (column.to_string(), format!("eq.{value}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let page = self
            .client
            .select::<SubscriptionRecord>(SUBSCRIPTIONS_TABLE, &params, None, false)
            .await?;
        Ok(page.rows.into_iter().next())
    }
}

#[async_trait]
impl SubscriptionStore for PostgrestSubscriptionStore {
    async fn by_user_id(&self, user_id: &str) -> RemoteResult<Option<SubscriptionRecord>> {
        self.find_one("user_id", user_id).await
    }

    async fn by_customer_id(&self, customer_id: &str) -> RemoteResult<Option<SubscriptionRecord>> {
        self.find_one("stripe_customer_id", customer_id).await
    }

    async fn upsert(&self, record: &SubscriptionRecord) -> RemoteResult<()> {
        self.client.upsert(SUBSCRIPTIONS_TABLE, record).await
    }
}
