//! # Payments Provider Client
//!
//! Stripe-backed checkout and customer management over the form-encoded
//! HTTP API. Only the two calls the application needs are wrapped:
//! customer creation and subscription checkout sessions.

use crate::infrastructure::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Public API host; overridable for tests.
const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Inputs for a subscription checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// Existing provider customer, when one is already linked.
    pub customer_id: Option<String>,
    /// Price to subscribe to.
    pub price_id: String,
    /// Plan code stamped into session and subscription metadata.
    pub plan_code: String,
    /// Application user id, round-tripped through `client_reference_id`.
    pub user_id: String,
    /// Redirect after a completed checkout.
    pub success_url: String,
    /// Redirect after an abandoned checkout.
    pub cancel_url: String,
}

/// Port to the payments provider.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Creates a customer linked to an application user.
    ///
    /// # Errors
    ///
    /// Returns a remote error when the provider call fails.
    async fn create_customer(&self, email: &str, user_id: &str) -> RemoteResult<String>;

    /// Creates a hosted checkout session and returns its redirect URL.
    ///
    /// # Errors
    ///
    /// Returns a remote error when the provider call fails.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> RemoteResult<String>;
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

/// Stripe client over the form-encoded REST API.
#[derive(Debug, Clone)]
pub struct StripeBillingClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeBillingClient {
    /// Creates a client against the public API host.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] when the client cannot be
    /// built.
    pub fn new(secret_key: impl Into<String>) -> RemoteResult<Self> {
        Self::with_api_base(DEFAULT_API_BASE, secret_key)
    }

    /// Creates a client against an explicit API host.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] when the client cannot be
    /// built.
    pub fn with_api_base(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::configuration(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> RemoteResult<CreatedObject> {
        let response = self
            .http
            .post(format!("{}/v1/{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        response
            .json::<CreatedObject>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode response: {e}")))
    }
}

#[async_trait]
impl BillingProvider for StripeBillingClient {
    async fn create_customer(&self, email: &str, user_id: &str) -> RemoteResult<String> {
        let form = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
        ];
        let created = self.post_form("customers", &form).await?;
        Ok(created.id)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> RemoteResult<String> {
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), request.price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("client_reference_id".to_string(), request.user_id.clone()),
            ("metadata[plan_code]".to_string(), request.plan_code.clone()),
            ("metadata[user_id]".to_string(), request.user_id.clone()),
            (
                "subscription_data[metadata][plan_code]".to_string(),
                request.plan_code.clone(),
            ),
            (
                "subscription_data[metadata][user_id]".to_string(),
                request.user_id.clone(),
            ),
        ];
        if let Some(customer_id) = &request.customer_id {
            form.push(("customer".to_string(), customer_id.clone()));
        }

        let created = self.post_form("checkout/sessions", &form).await?;
        created
            .url
            .ok_or_else(|| RemoteError::protocol("checkout session missing url"))
    }
}
