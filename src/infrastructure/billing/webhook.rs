//! # Webhook Signature Verification and Event Decoding
//!
//! Payment provider webhooks arrive as a raw JSON body plus a signature
//! header of the form `t=<unix-ts>,v1=<hex-hmac>`. The HMAC-SHA256 is
//! computed over `"{t}.{body}"` with the endpoint's signing secret, and the
//! timestamp must be within a fixed tolerance to defeat replay.
//!
//! Decoding reduces the provider's event zoo to the handful of variants the
//! application reacts to; everything else becomes [`WebhookEvent::Ignored`].

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and future skew) of a signed payload, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Webhook verification or decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature header missing or malformed.
    #[error("malformed signature header")]
    MalformedHeader,

    /// Signed timestamp outside the accepted tolerance.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    /// HMAC did not match any provided `v1` signature.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// Payload was not a decodable event.
    #[error("undecodable event payload: {0}")]
    InvalidPayload(String),
}

/// Subscription fields carried by the events the system reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionPayload {
    /// Provider subscription id.
    pub id: String,
    /// Provider customer id.
    pub customer: String,
    /// Subscription status as reported by the provider.
    pub status: String,
    /// First subscription item's price id, when present.
    #[serde(default)]
    pub price_id: Option<String>,
    /// Period end as a unix timestamp.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

/// Checkout session fields the system reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutPayload {
    /// Provider customer id.
    pub customer: String,
    /// Provider subscription id created by the checkout.
    #[serde(default)]
    pub subscription: Option<String>,
    /// Application user id, from `client_reference_id` or metadata.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Plan code stamped into the session metadata at creation time.
    #[serde(default)]
    pub plan_code: Option<String>,
}

/// A webhook event reduced to what the application handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A checkout session finished; links customer to user and plan.
    CheckoutCompleted(CheckoutPayload),
    /// A subscription was created or updated.
    SubscriptionUpserted(SubscriptionPayload),
    /// A subscription was cancelled.
    SubscriptionDeleted(SubscriptionPayload),
    /// Any other event kind; acknowledged and dropped.
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// Verifies a signature header against the raw payload.
///
/// `now` is the caller's unix clock, injected so the tolerance window is
/// testable.
///
/// # Errors
///
/// Returns a [`WebhookError`] when the header is malformed, the timestamp
/// is stale or the HMAC does not match.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    for candidate in signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            continue;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        // verify_slice is constant-time.
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }
    Err(WebhookError::SignatureMismatch)
}

/// Decodes a verified payload into a [`WebhookEvent`].
///
/// # Errors
///
/// Returns [`WebhookError::InvalidPayload`] when the body is not a JSON
/// event or a handled event is missing its object fields.
pub fn decode_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    match raw.kind.as_str() {
        "checkout.session.completed" => {
            let mut checkout: CheckoutPayload = serde_json::from_value(raw.data.object.clone())
                .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
            if checkout.plan_code.is_none() {
                checkout.plan_code = metadata_str(&raw.data.object, "plan_code");
            }
            if checkout.client_reference_id.is_none() {
                checkout.client_reference_id = metadata_str(&raw.data.object, "user_id");
            }
            Ok(WebhookEvent::CheckoutCompleted(checkout))
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            Ok(WebhookEvent::SubscriptionUpserted(subscription_payload(&raw.data.object)?))
        }
        "customer.subscription.deleted" => {
            Ok(WebhookEvent::SubscriptionDeleted(subscription_payload(&raw.data.object)?))
        }
        other => Ok(WebhookEvent::Ignored(other.to_string())),
    }
}

fn subscription_payload(object: &serde_json::Value) -> Result<SubscriptionPayload, WebhookError> {
    let mut payload: SubscriptionPayload = serde_json::from_value(object.clone())
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    if payload.price_id.is_none() {
        payload.price_id = object
            .pointer("/items/data/0/price/id")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);
    }
    Ok(payload)
}

fn metadata_str(object: &serde_json::Value, key: &str) -> Option<String> {
    object
        .pointer(&format!("/metadata/{key}"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
