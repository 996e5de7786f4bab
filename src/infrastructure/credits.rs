//! # Credit Ledger Client
//!
//! Read and consume a user's monthly search credit allotment through the
//! remote ledger's atomic stored procedures. There is no local transaction
//! logic: check-then-debit atomicity lives entirely at the remote end, this
//! client only passes a fingerprint along for dedup/audit correlation.

use crate::domain::credits::UserCreditStatus;
use crate::infrastructure::error::RemoteResult;
use crate::infrastructure::postgrest::PostgrestClient;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Port to the remote credit ledger.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Reads the current plan and usage. No mutation.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn status(&self, user_id: &str) -> RemoteResult<UserCreditStatus>;

    /// Attempts to debit `cost` credits.
    ///
    /// Insufficient credits come back as `ok = false` with a message; that
    /// is a first-class result, never an `Err`.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn consume(
        &self,
        user_id: &str,
        cost: u32,
        endpoint: &str,
        fingerprint: Option<&str>,
    ) -> RemoteResult<UserCreditStatus>;
}

/// Ledger client over the PostgREST RPC transport.
#[derive(Clone)]
pub struct PostgrestCreditLedger {
    client: Arc<PostgrestClient>,
}

impl PostgrestCreditLedger {
    /// Creates a ledger client over a shared PostgREST client.
    #[must_use]
    pub fn new(client: Arc<PostgrestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CreditLedger for PostgrestCreditLedger {
    async fn status(&self, user_id: &str) -> RemoteResult<UserCreditStatus> {
        self.client
            .rpc("get_user_credit_status", &json!({ "p_user_id": user_id }))
            .await
    }

    async fn consume(
        &self,
        user_id: &str,
        cost: u32,
        endpoint: &str,
        fingerprint: Option<&str>,
    ) -> RemoteResult<UserCreditStatus> {
        self.client
            .rpc(
                "consume_user_search_credit",
                &json!({
                    "p_user_id": user_id,
                    "p_cost": cost,
                    "p_endpoint": endpoint,
                    "p_query_fingerprint": fingerprint,
                }),
            )
            .await
    }
}
