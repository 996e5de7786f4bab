//! # Credit Status
//!
//! Remote-owned record describing a user's monthly search credit allotment.
//!
//! The record is produced by the remote ledger's stored procedures and is
//! never written directly by this application. "Insufficient credits" is a
//! first-class `ok = false` result, not an error.

use serde::{Deserialize, Serialize};

/// Current credit standing for a user, as reported by the remote ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCreditStatus {
    /// Whether the operation (read or debit) succeeded.
    pub ok: bool,
    /// User the record belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Start of the current accounting period (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    /// Active plan code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_code: Option<String>,
    /// Provider-reported subscription status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<String>,
    /// Monthly allotment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_credits: Option<i64>,
    /// Credits used this period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_credits: Option<i64>,
    /// Credits remaining this period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_credits: Option<i64>,
    /// Credits the rejected operation would have needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_credits: Option<i64>,
    /// Whether this call debited credits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charged: Option<bool>,
    /// Human-readable detail, set on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_rejection_payload() {
        let status: UserCreditStatus = serde_json::from_str(
            r#"{"ok":false,"remaining_credits":0,"required_credits":3,"message":"no credits"}"#,
        )
        .unwrap();
        assert!(!status.ok);
        assert_eq!(status.required_credits, Some(3));
        assert_eq!(status.message.as_deref(), Some("no credits"));
    }

    #[test]
    fn omits_absent_fields_when_serializing() {
        let json = serde_json::to_string(&UserCreditStatus {
            ok: true,
            remaining_credits: Some(10),
            ..UserCreditStatus::default()
        })
        .unwrap();
        assert!(json.contains("remaining_credits"));
        assert!(!json.contains("message"));
    }
}
