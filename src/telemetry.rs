//! # Telemetry
//!
//! Tracing initialization and a redaction helper for logging request
//! parameters. Production emits JSON lines; development keeps the compact
//! human format. `RUST_LOG` overrides the default filter.

use std::collections::BTreeMap;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Lowercased key fragments that must never reach the logs.
const SECRET_KEY_FRAGMENTS: [&str; 6] =
    ["apikey", "authorization", "token", "key", "secret", "password"];

/// Installs the global tracing subscriber.
///
/// `json` selects machine-readable output; pass the production flag.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,servidir=debug,tower_http=debug"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

/// Returns true when a parameter key looks like credential material.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SECRET_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Copies key-value pairs with credential-looking values masked.
///
/// Used when logging inbound query parameters and outbound request
/// parameters.
#[must_use]
pub fn redact_pairs<'a, I>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key) {
                "[redacted]".to_string()
            } else {
                value.to_string()
            };
            (key.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_keys_are_detected_case_insensitively() {
        assert!(is_sensitive_key("apikey"));
        assert!(is_sensitive_key("Authorization"));
        assert!(is_sensitive_key("SUPABASE_SERVICE_ROLE_KEY"));
        assert!(is_sensitive_key("webhook_secret"));
        assert!(!is_sensitive_key("country"));
        assert!(!is_sensitive_key("maxPrice"));
    }

    #[test]
    fn redaction_masks_values_but_keeps_keys() {
        let redacted = redact_pairs([("country", "ES"), ("apikey", "sk_live_123")]);
        assert_eq!(redacted.get("country").map(String::as_str), Some("ES"));
        assert_eq!(
            redacted.get("apikey").map(String::as_str),
            Some("[redacted]")
        );
    }
}
