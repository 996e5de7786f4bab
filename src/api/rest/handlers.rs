//! Route handlers and the shared application state.
//!
//! Authentication is a bearer `Authorization` header or the session access
//! cookie set by the auth callback. Credit charging happens before the data
//! query on the items route; a refused charge never reaches the data
//! source.

use crate::api::rest::error::ApiError;
use crate::application::error::ApplicationError;
use crate::application::services::catalog::CatalogService;
use crate::application::services::credit_cost::{has_active_filters, search_credit_cost};
use crate::application::services::fingerprint::query_fingerprint;
use crate::application::services::subscription_sync::SubscriptionSyncService;
use crate::domain::billing::{PlanCode, SubscriptionRecord};
use crate::domain::catalog::{BusinessDetail, PagedResult, References, ServiceItem};
use crate::domain::credits::UserCreditStatus;
use crate::domain::filters::parse_filters;
use crate::infrastructure::auth::{AuthProvider, AuthUser};
use crate::infrastructure::billing::stripe::{BillingProvider, CheckoutSessionRequest};
use crate::infrastructure::billing::subscriptions::SubscriptionStore;
use crate::infrastructure::billing::webhook::{decode_event, verify_signature};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::credits::CreditLedger;
use crate::telemetry;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Session access-token cookie name.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Session refresh-token cookie name.
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Ledger endpoint tag for items searches.
const ITEMS_ENDPOINT: &str = "items_api";

/// Post-login landing path.
const DEFAULT_NEXT_PATH: &str = "/items";

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration.
    pub config: AppConfig,
    /// Catalog search and lookup service.
    pub catalog: CatalogService,
    /// Credit ledger port.
    pub ledger: Arc<dyn CreditLedger>,
    /// Auth provider port.
    pub auth: Arc<dyn AuthProvider>,
    /// Payments provider port.
    pub billing: Arc<dyn BillingProvider>,
    /// Subscription record store.
    pub subscriptions: Arc<dyn SubscriptionStore>,
    /// Webhook event application service.
    pub subscription_sync: SubscriptionSyncService,
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process answers.
    pub status: &'static str,
}

/// Items page plus the caller's credit status.
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    /// The result page.
    #[serde(flatten)]
    pub page: PagedResult,
    /// Ledger status: the debit result on charged requests, a plain read
    /// on free ones.
    pub credits: UserCreditStatus,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Plan code to subscribe to.
    pub plan: String,
}

/// Dev magic-link request body.
#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    /// Recipient email.
    pub email: String,
    /// Post-login path.
    #[serde(default)]
    pub next: Option<String>,
}

/// Auth callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// PKCE exchange code.
    #[serde(default)]
    pub code: Option<String>,
    /// OTP token hash (magic link flow).
    #[serde(default)]
    pub token_hash: Option<String>,
    /// OTP type accompanying `token_hash`.
    #[serde(default, rename = "type")]
    pub otp_type: Option<String>,
    /// Post-login path.
    #[serde(default)]
    pub next: Option<String>,
}

fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);
    bearer.or_else(|| jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
}

async fn require_user(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Result<AuthUser, ApiError> {
    let token = session_token(headers, jar).ok_or(ApplicationError::Unauthorized)?;
    let user = state
        .auth
        .user_from_token(&token)
        .await
        .map_err(ApplicationError::from)?;
    user.ok_or_else(|| ApplicationError::Unauthorized.into())
}

/// Keeps redirects on this origin.
fn safe_next(next: Option<String>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DEFAULT_NEXT_PATH.to_string(),
    }
}

/// `GET /api/v1/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /api/v1/items`
///
/// Unknown or invalid query parameters fall back to defaults; they are
/// never an error.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let user = require_user(&state, &headers, &jar).await?;
    let filters = parse_filters(&pairs);
    tracing::debug!(
        user_id = %user.id,
        params = ?telemetry::redact_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        "items search"
    );

    // Charge before the data query; only page 1 of an actual search costs.
    // Free requests still report the current balance.
    let credits = if (has_active_filters(&filters) || filters.show_all) && filters.page == 1 {
        let cost = search_credit_cost(&filters);
        let fingerprint = query_fingerprint(&filters);
        let status = state
            .ledger
            .consume(&user.id, cost, ITEMS_ENDPOINT, Some(&fingerprint))
            .await
            .map_err(ApplicationError::from)?;
        if !status.ok {
            return Err(ApplicationError::insufficient_credits(status).into());
        }
        status
    } else {
        state
            .ledger
            .status(&user.id)
            .await
            .map_err(ApplicationError::from)?
    };

    let page = state.catalog.list_items(&filters).await?;
    Ok(Json(ItemsResponse { page, credits }))
}

/// `GET /api/v1/items/{id}`
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceItem>, ApiError> {
    let item = state.catalog.get_service(&id).await?;
    let item = item.ok_or_else(|| ApplicationError::not_found("service", &id))?;
    Ok(Json(item))
}

/// `GET /api/v1/businesses/{id}`
pub async fn get_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BusinessDetail>, ApiError> {
    let detail = state.catalog.get_business_detail(&id).await?;
    let detail = detail.ok_or_else(|| ApplicationError::not_found("business", &id))?;
    Ok(Json(detail))
}

/// `GET /api/v1/reference`
pub async fn get_reference(
    State(state): State<Arc<AppState>>,
) -> Result<Json<References>, ApiError> {
    Ok(Json(state.catalog.get_references().await?))
}

/// `GET /api/v1/credits`
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<UserCreditStatus>, ApiError> {
    let user = require_user(&state, &headers, &jar).await?;
    let status = state
        .ledger
        .status(&user.id)
        .await
        .map_err(ApplicationError::from)?;
    Ok(Json(status))
}

/// `POST /api/v1/billing/checkout`
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &headers, &jar).await?;

    let plan: PlanCode = request
        .plan
        .parse()
        .map_err(|_| ApplicationError::validation(format!("unknown plan: {}", request.plan)))?;
    let price_id = state
        .config
        .plan_prices
        .price_for(plan)
        .ok_or_else(|| ApplicationError::validation("plan is not purchasable"))?
        .to_string();

    let mut record = state
        .subscriptions
        .by_user_id(&user.id)
        .await
        .map_err(ApplicationError::from)?
        .unwrap_or_else(|| SubscriptionRecord::stub(&user.id));

    let customer_id = match record.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let email = user.email.as_deref().unwrap_or_default();
            let id = state
                .billing
                .create_customer(email, &user.id)
                .await
                .map_err(ApplicationError::from)?;
            record.stripe_customer_id = Some(id.clone());
            state
                .subscriptions
                .upsert(&record)
                .await
                .map_err(ApplicationError::from)?;
            id
        }
    };

    let url = state
        .billing
        .create_checkout_session(&CheckoutSessionRequest {
            customer_id: Some(customer_id),
            price_id,
            plan_code: plan.as_str().to_string(),
            user_id: user.id.clone(),
            success_url: format!("{}/billing?checkout=success", state.config.app_url),
            cancel_url: format!("{}/billing?checkout=cancelled", state.config.app_url),
        })
        .await
        .map_err(ApplicationError::from)?;

    tracing::info!(user_id = %user.id, plan = %plan, "checkout session created");
    Ok(Json(json!({ "url": url })))
}

/// `POST /api/v1/billing/webhook`
pub async fn billing_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApplicationError::invalid_signature("missing signature header"))?;

    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        Utc::now().timestamp(),
    )
    .map_err(|e| ApplicationError::invalid_signature(e.to_string()))?;

    let event =
        decode_event(&body).map_err(|e| ApplicationError::validation(e.to_string()))?;
    let outcome = state.subscription_sync.apply(event).await?;
    tracing::debug!(?outcome, "webhook processed");
    Ok(Json(json!({ "received": true })))
}

/// `GET /auth/callback`
///
/// Exchanges a sign-in code or OTP token hash for a session, stores the
/// tokens in HttpOnly cookies and redirects to the requested path.
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let next = safe_next(params.next);

    let session = match (params.code, params.token_hash, params.otp_type) {
        (Some(code), _, _) => state.auth.exchange_code(&code).await,
        (None, Some(hash), Some(otp_type)) => state.auth.verify_otp(&hash, &otp_type).await,
        _ => {
            return (jar, Redirect::to("/login?error=missing_code"));
        }
    };

    match session {
        Ok(session) => {
            let mut jar = jar.add(session_cookie(ACCESS_TOKEN_COOKIE, session.access_token));
            if let Some(refresh) = session.refresh_token {
                jar = jar.add(session_cookie(REFRESH_TOKEN_COOKIE, refresh));
            }
            (jar, Redirect::to(&next))
        }
        Err(error) => {
            tracing::warn!(error = %error, "sign-in exchange failed");
            (jar, Redirect::to("/login?error=auth_failed"))
        }
    }
}

/// `POST /auth/logout`
///
/// Upstream revocation failure is absorbed; the local session is cleared
/// either way.
pub async fn auth_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(token) = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()) {
        if let Err(error) = state.auth.sign_out(&token).await {
            tracing::warn!(error = %error, "upstream sign-out failed");
        }
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));
    (jar, Redirect::to("/login"))
}

/// `POST /api/v1/dev/auth/magic-link`
///
/// Development convenience only; answers 404 in production.
pub async fn dev_magic_link(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MagicLinkRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.config.is_production() {
        return Err(ApplicationError::not_found("route", "dev/auth/magic-link").into());
    }
    if !request.email.contains('@') {
        return Err(ApplicationError::validation("invalid email").into());
    }

    let next = safe_next(request.next);
    let redirect_to = format!("{}/auth/callback?next={next}", state.config.app_url);
    let link = state
        .auth
        .generate_magic_link(&request.email, &redirect_to)
        .await
        .map_err(ApplicationError::from)?;

    let callback_url = link.hashed_token.as_ref().map(|hash| {
        format!(
            "{}/auth/callback?token_hash={hash}&type=magiclink&next={next}",
            state.config.app_url
        )
    });
    Ok(Json(json!({
        "action_link": link.action_link,
        "callback_url": callback_url,
    })))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
