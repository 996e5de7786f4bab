//! Service entry point: configuration, client wiring and the HTTP server.

use anyhow::Context;
use servidir::api::rest::{AppState, create_router};
use servidir::application::services::catalog::CatalogService;
use servidir::application::services::subscription_sync::SubscriptionSyncService;
use servidir::infrastructure::auth::GoTrueAuthClient;
use servidir::infrastructure::billing::stripe::StripeBillingClient;
use servidir::infrastructure::billing::subscriptions::PostgrestSubscriptionStore;
use servidir::infrastructure::config::AppConfig;
use servidir::infrastructure::credits::PostgrestCreditLedger;
use servidir::infrastructure::postgrest::PostgrestClient;
use servidir::telemetry;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine outside development.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    telemetry::init(config.is_production());

    let postgrest = Arc::new(
        PostgrestClient::new(&config.supabase_url, &config.service_key)
            .context("failed to build data-source client")?,
    );
    let auth = Arc::new(
        GoTrueAuthClient::new(&config.supabase_url, &config.anon_key, &config.service_key)
            .context("failed to build auth client")?,
    );
    let billing = Arc::new(
        StripeBillingClient::new(&config.stripe_secret_key)
            .context("failed to build billing client")?,
    );
    let subscriptions = Arc::new(PostgrestSubscriptionStore::new(postgrest.clone()));

    let state = Arc::new(AppState {
        catalog: CatalogService::new(postgrest.clone()),
        ledger: Arc::new(PostgrestCreditLedger::new(postgrest)),
        auth,
        billing,
        subscriptions: subscriptions.clone(),
        subscription_sync: SubscriptionSyncService::new(
            subscriptions,
            config.plan_prices.clone(),
        ),
        config: config.clone(),
    });

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, environment = %config.environment, "listening");

    axum::serve(listener, router)
        .await
        .context("server exited")?;
    Ok(())
}
