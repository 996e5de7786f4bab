//! # Query Fingerprint
//!
//! Deterministic digest of a normalized filter record, used for
//! idempotency and audit correlation of credit charges in the remote
//! ledger. Not a security mechanism.
//!
//! The page is forced to 1 before hashing: a fingerprint identifies "first
//! page of a search", so re-paginating the same query keeps the same
//! fingerprint.

use crate::domain::filters::Filters;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 32;

/// Computes the fingerprint of a filter record.
///
/// Identical normalized filter records always produce the identical
/// 32-character lowercase hex digest, regardless of the requested page.
#[must_use]
pub fn query_fingerprint(filters: &Filters) -> String {
    let canonical = Filters {
        page: 1,
        ..filters.clone()
    };
    let payload = serde_json::to_string(&canonical).unwrap_or_default();
    let digest = Sha256::digest(payload.as_bytes());
    let mut hex_digest = hex::encode(digest);
    hex_digest.truncate(FINGERPRINT_LEN);
    hex_digest
}
