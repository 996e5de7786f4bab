//! Router assembly.

use crate::api::rest::handlers::{self, AppState};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full application router.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/items", get(handlers::list_items))
        .route("/api/v1/items/{id}", get(handlers::get_item))
        .route("/api/v1/businesses/{id}", get(handlers::get_business))
        .route("/api/v1/reference", get(handlers::get_reference))
        .route("/api/v1/credits", get(handlers::get_credits))
        .route("/api/v1/billing/checkout", post(handlers::create_checkout))
        .route("/api/v1/billing/webhook", post(handlers::billing_webhook))
        .route("/auth/callback", get(handlers::auth_callback))
        .route("/auth/logout", post(handlers::auth_logout))
        .route(
            "/api/v1/dev/auth/magic-link",
            post(handlers::dev_magic_link),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::services::catalog::{
        CatalogService, SearchGateway, ServicePage,
    };
    use crate::application::services::subscription_sync::SubscriptionSyncService;
    use crate::domain::billing::SubscriptionRecord;
    use crate::domain::catalog::{ReferenceOption, ServiceItem};
    use crate::domain::credits::UserCreditStatus;
    use crate::infrastructure::auth::{AuthProvider, AuthSession, AuthUser, MagicLink};
    use crate::infrastructure::billing::stripe::{BillingProvider, CheckoutSessionRequest};
    use crate::infrastructure::billing::subscriptions::SubscriptionStore;
    use crate::infrastructure::billing::PlanPrices;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::credits::CreditLedger;
    use crate::infrastructure::error::{RemoteError, RemoteResult};
    use crate::infrastructure::postgrest::{RowRange, SearchQuery};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use sha2::Sha256;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const WEBHOOK_SECRET: &str = "whsec_route_test";

    struct StubAuth {
        user: Option<AuthUser>,
    }

    #[async_trait]
    impl AuthProvider for StubAuth {
        async fn user_from_token(&self, _token: &str) -> RemoteResult<Option<AuthUser>> {
            Ok(self.user.clone())
        }

        async fn exchange_code(&self, _code: &str) -> RemoteResult<AuthSession> {
            Ok(AuthSession {
                access_token: "at-1".to_string(),
                refresh_token: Some("rt-1".to_string()),
            })
        }

        async fn verify_otp(&self, _hash: &str, _otp_type: &str) -> RemoteResult<AuthSession> {
            Err(RemoteError::authentication("otp rejected"))
        }

        async fn sign_out(&self, _token: &str) -> RemoteResult<()> {
            Ok(())
        }

        async fn generate_magic_link(
            &self,
            _email: &str,
            _redirect_to: &str,
        ) -> RemoteResult<MagicLink> {
            Ok(MagicLink {
                action_link: Some("https://auth.test/link".to_string()),
                hashed_token: Some("hash-1".to_string()),
            })
        }
    }

    struct RecordingLedger {
        grant: bool,
        consumed: Mutex<Vec<(String, u32, String, Option<String>)>>,
    }

    impl RecordingLedger {
        fn new(grant: bool) -> Self {
            Self {
                grant,
                consumed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CreditLedger for RecordingLedger {
        async fn status(&self, _user_id: &str) -> RemoteResult<UserCreditStatus> {
            Ok(UserCreditStatus {
                ok: true,
                remaining_credits: Some(10),
                ..UserCreditStatus::default()
            })
        }

        async fn consume(
            &self,
            user_id: &str,
            cost: u32,
            endpoint: &str,
            fingerprint: Option<&str>,
        ) -> RemoteResult<UserCreditStatus> {
            self.consumed.lock().unwrap().push((
                user_id.to_string(),
                cost,
                endpoint.to_string(),
                fingerprint.map(ToString::to_string),
            ));
            Ok(UserCreditStatus {
                ok: self.grant,
                charged: Some(self.grant),
                remaining_credits: Some(if self.grant { 9 } else { 0 }),
                message: (!self.grant).then(|| "insufficient credits".to_string()),
                ..UserCreditStatus::default()
            })
        }
    }

    struct CountingGateway {
        rows: Vec<ServiceItem>,
        calls: Mutex<u32>,
    }

    impl CountingGateway {
        fn new(rows: Vec<ServiceItem>) -> Self {
            Self {
                rows,
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SearchGateway for CountingGateway {
        async fn fetch_services(
            &self,
            _query: &SearchQuery,
            _range: RowRange,
        ) -> RemoteResult<ServicePage> {
            *self.calls.lock().unwrap() += 1;
            Ok(ServicePage {
                rows: self.rows.clone(),
                total: self.rows.len() as u64,
            })
        }

        async fn fetch_reference(&self, table: &str) -> RemoteResult<Vec<ReferenceOption>> {
            Ok(vec![ReferenceOption {
                code: table.to_string(),
                label: table.to_uppercase(),
            }])
        }
    }

    struct StubBilling;

    #[async_trait]
    impl BillingProvider for StubBilling {
        async fn create_customer(&self, _email: &str, _user_id: &str) -> RemoteResult<String> {
            Ok("cus_test".to_string())
        }

        async fn create_checkout_session(
            &self,
            _request: &CheckoutSessionRequest,
        ) -> RemoteResult<String> {
            Ok("https://checkout.test/session".to_string())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, SubscriptionRecord>>,
    }

    impl MemoryStore {
        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubscriptionStore for MemoryStore {
        async fn by_user_id(&self, user_id: &str) -> RemoteResult<Option<SubscriptionRecord>> {
            Ok(self.rows.lock().unwrap().get(user_id).cloned())
        }

        async fn by_customer_id(
            &self,
            customer_id: &str,
        ) -> RemoteResult<Option<SubscriptionRecord>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|r| r.stripe_customer_id.as_deref() == Some(customer_id))
                .cloned())
        }

        async fn upsert(&self, record: &SubscriptionRecord) -> RemoteResult<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(record.user_id.clone(), record.clone());
            Ok(())
        }
    }

    fn test_config(environment: &str) -> AppConfig {
        AppConfig {
            supabase_url: "https://proj.supabase.test".to_string(),
            service_key: "service".to_string(),
            anon_key: "anon".to_string(),
            stripe_secret_key: "sk_test".to_string(),
            stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
            plan_prices: PlanPrices {
                starter: "price_s".to_string(),
                pro: "price_p".to_string(),
                agency: "price_a".to_string(),
            },
            app_url: "https://app.test".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            environment: environment.to_string(),
            auth_debug: true,
        }
    }

    struct Harness {
        router: Router,
        ledger: Arc<RecordingLedger>,
        gateway: Arc<CountingGateway>,
        store: Arc<MemoryStore>,
    }

    fn harness(user: Option<AuthUser>, grant: bool, environment: &str) -> Harness {
        let gateway = Arc::new(CountingGateway::new(Vec::new()));
        let ledger = Arc::new(RecordingLedger::new(grant));
        let store = Arc::new(MemoryStore::default());
        let config = test_config(environment);
        let state = Arc::new(AppState {
            subscription_sync: SubscriptionSyncService::new(
                store.clone(),
                config.plan_prices.clone(),
            ),
            config,
            catalog: CatalogService::new(gateway.clone()),
            ledger: ledger.clone(),
            auth: Arc::new(StubAuth { user }),
            billing: Arc::new(StubBilling),
            subscriptions: store.clone(),
        });
        Harness {
            router: create_router(state),
            ledger,
            gateway,
            store,
        }
    }

    fn signed_in_user() -> Option<AuthUser> {
        Some(AuthUser {
            id: "user-1".to_string(),
            email: Some("a@b.test".to_string()),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sign_webhook(payload: &[u8]) -> String {
        let timestamp = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let h = harness(None, true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn items_requires_a_session() {
        let h = harness(None, true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items?q=corte")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.ledger.consumed.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn active_search_charges_before_querying() {
        let h = harness(signed_in_user(), true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items?q=corte")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let consumed = h.ledger.consumed.lock().unwrap().clone();
        assert_eq!(consumed.len(), 1);
        let (user_id, cost, endpoint, fingerprint) = &consumed[0];
        assert_eq!(user_id, "user-1");
        assert_eq!(*cost, 1);
        assert_eq!(endpoint, "items_api");
        assert_eq!(fingerprint.as_ref().map(String::len), Some(32));

        let body = body_json(response).await;
        assert_eq!(body["credits"]["remaining_credits"], json!(9));
    }

    #[tokio::test]
    async fn refused_charge_is_402_and_skips_the_data_query() {
        let h = harness(signed_in_user(), false, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items?q=corte")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(h.gateway.call_count(), 0);

        let body = body_json(response).await;
        assert_eq!(body["error"], json!("insufficient_credits"));
        assert_eq!(body["credits"]["remaining_credits"], json!(0));
    }

    #[tokio::test]
    async fn default_browse_on_page_one_is_free() {
        let h = harness(signed_in_user(), true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.ledger.consumed.lock().unwrap().len(), 0);
        assert_eq!(h.gateway.call_count(), 1);

        // Balance is reported even though nothing was debited.
        let body = body_json(response).await;
        assert_eq!(body["credits"]["remaining_credits"], json!(10));
    }

    #[tokio::test]
    async fn later_pages_of_an_active_search_are_free() {
        let h = harness(signed_in_user(), true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items?q=corte&page=2")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.ledger.consumed.lock().unwrap().len(), 0);

        let body = body_json(response).await;
        assert_eq!(body["credits"]["remaining_credits"], json!(10));
    }

    #[tokio::test]
    async fn missing_item_is_404() {
        let h = harness(None, true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items/svc-missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_400_and_mutates_nothing() {
        let h = harness(None, true, "development");
        let payload = serde_json::to_vec(&json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": "cus_1",
                "client_reference_id": "user-1"
            }}
        }))
        .unwrap();

        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/webhook")
                    .header("stripe-signature", "t=1,v1=deadbeef")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn signed_checkout_webhook_links_the_subscription() {
        let h = harness(None, true, "development");
        let payload = serde_json::to_vec(&json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": "cus_1",
                "subscription": "sub_1",
                "client_reference_id": "user-1",
                "metadata": { "plan_code": "pro" }
            }}
        }))
        .unwrap();

        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/webhook")
                    .header("stripe-signature", sign_webhook(&payload))
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn checkout_rejects_an_unknown_plan() {
        let h = harness(signed_in_user(), true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/checkout")
                    .header("authorization", "Bearer tok")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"plan":"platinum"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_creates_a_customer_and_returns_the_url() {
        let h = harness(signed_in_user(), true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/checkout")
                    .header("authorization", "Bearer tok")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"plan":"pro"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["url"], json!("https://checkout.test/session"));
        // The stub row persisted the linked customer.
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn callback_sets_cookies_and_redirects() {
        let h = harness(None, true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/callback?code=abc&next=/billing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/billing"
        );
        let cookies: Vec<_> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=at-1")));
        assert!(cookies.iter().any(|c| c.contains("HttpOnly")));
    }

    #[tokio::test]
    async fn magic_link_route_is_hidden_in_production() {
        let h = harness(None, true, "production");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/dev/auth/magic-link")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.test"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn magic_link_returns_callback_material_in_development() {
        let h = harness(None, true, "development");
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/dev/auth/magic-link")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.test","next":"/items"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(
            body["callback_url"]
                .as_str()
                .unwrap()
                .contains("token_hash=hash-1")
        );
    }
}
