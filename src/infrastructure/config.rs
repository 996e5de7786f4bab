//! # Application Configuration
//!
//! Environment-driven configuration, loaded once at startup. A `.env` file
//! is honored in development via `dotenvy`; real deployments set plain
//! environment variables.
//!
//! The data-source key resolves with a precedence chain: the service-role
//! key wins, then its legacy alias, then the anon key. The service answers
//! with its own key regardless of the caller's session.

use crate::infrastructure::billing::PlanPrices;
use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing or empty.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// The environment could not be read into the expected shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    supabase_url: Option<String>,
    supabase_service_role_key: Option<String>,
    supabase_service_key: Option<String>,
    supabase_anon_key: Option<String>,
    stripe_secret_key: Option<String>,
    stripe_webhook_secret: Option<String>,
    stripe_price_starter: Option<String>,
    stripe_price_pro: Option<String>,
    stripe_price_agency: Option<String>,
    app_url: Option<String>,
    bind_addr: Option<String>,
    environment: Option<String>,
    auth_debug: Option<bool>,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the data-source / auth provider project.
    pub supabase_url: String,
    /// Key used for PostgREST and admin auth calls.
    pub service_key: String,
    /// Key used for user-facing auth calls.
    pub anon_key: String,
    /// Payments provider secret key.
    pub stripe_secret_key: String,
    /// Webhook endpoint signing secret.
    pub stripe_webhook_secret: String,
    /// Plan to price-id mapping.
    pub plan_prices: PlanPrices,
    /// Public base URL of this application, for redirects.
    pub app_url: String,
    /// Socket address to listen on.
    pub bind_addr: String,
    /// Deployment environment name (`development`, `production`, ...).
    pub environment: String,
    /// Enables the dev-only magic-link route.
    pub auth_debug: bool,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is absent or the
    /// environment cannot be deserialized.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let supabase_url = require(raw.supabase_url, "SUPABASE_URL")?;
        let anon_key = require(raw.supabase_anon_key, "SUPABASE_ANON_KEY")?;
        let service_key = raw
            .supabase_service_role_key
            .filter(|k| !k.is_empty())
            .or(raw.supabase_service_key.filter(|k| !k.is_empty()))
            .unwrap_or_else(|| anon_key.clone());

        let environment = raw
            .environment
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "development".to_string());

        Ok(Self {
            supabase_url,
            service_key,
            anon_key,
            stripe_secret_key: require(raw.stripe_secret_key, "STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: require(raw.stripe_webhook_secret, "STRIPE_WEBHOOK_SECRET")?,
            plan_prices: PlanPrices {
                starter: require(raw.stripe_price_starter, "STRIPE_PRICE_STARTER")?,
                pro: require(raw.stripe_price_pro, "STRIPE_PRICE_PRO")?,
                agency: require(raw.stripe_price_agency, "STRIPE_PRICE_AGENCY")?,
            },
            app_url: require(raw.app_url, "APP_URL")?,
            bind_addr: raw
                .bind_addr
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            environment,
            auth_debug: raw.auth_debug.unwrap_or(false),
        })
    }

    /// Returns true when running a production deployment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn require(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw() -> RawConfig {
        RawConfig {
            supabase_url: Some("https://proj.supabase.test".to_string()),
            supabase_service_role_key: Some("service-role".to_string()),
            supabase_service_key: Some("legacy-service".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            stripe_secret_key: Some("sk_test".to_string()),
            stripe_webhook_secret: Some("whsec_test".to_string()),
            stripe_price_starter: Some("price_s".to_string()),
            stripe_price_pro: Some("price_p".to_string()),
            stripe_price_agency: Some("price_a".to_string()),
            app_url: Some("https://app.test".to_string()),
            bind_addr: None,
            environment: None,
            auth_debug: None,
        }
    }

    #[test]
    fn service_role_key_wins_the_precedence_chain() {
        let config = AppConfig::from_raw(raw()).unwrap();
        assert_eq!(config.service_key, "service-role");
    }

    #[test]
    fn legacy_service_key_backfills_then_anon() {
        let mut r = raw();
        r.supabase_service_role_key = None;
        assert_eq!(AppConfig::from_raw(r).unwrap().service_key, "legacy-service");

        let mut r = raw();
        r.supabase_service_role_key = None;
        r.supabase_service_key = Some(String::new());
        assert_eq!(AppConfig::from_raw(r).unwrap().service_key, "anon");
    }

    #[test]
    fn missing_required_variable_is_named_in_the_error() {
        let mut r = raw();
        r.stripe_webhook_secret = None;
        let err = AppConfig::from_raw(r).unwrap_err();
        assert!(err.to_string().contains("STRIPE_WEBHOOK_SECRET"));
    }

    #[test]
    fn defaults_apply_for_optional_settings() {
        let config = AppConfig::from_raw(raw()).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.environment, "development");
        assert!(!config.auth_debug);
        assert!(!config.is_production());
    }
}
