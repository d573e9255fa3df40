//! Deterministic identifiers derived from request data.
//!
//! The mock never stores disbursements, so every id it reports has to be
//! recomputable from the request alone: repeated calls with the same
//! external id yield the same disbursement id, and the webhook id changes
//! only when the reported status does.

use sha2::{Digest, Sha256};

use crate::DisbursementStatus;

/// Prefix of every disbursement id.
pub const DISBURSEMENT_ID_PREFIX: &str = "disb_";

/// Prefix of every webhook id.
pub const WEBHOOK_ID_PREFIX: &str = "wh_";

/// First eight hex characters of the SHA-256 digest of `value`.
pub fn short_hash(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Disbursement id for an external id.
pub fn disbursement_id(external_id: &str) -> String {
    format!("{}{}", DISBURSEMENT_ID_PREFIX, short_hash(external_id))
}

/// Webhook id for a disbursement in a given status.
pub fn webhook_id(disbursement_id: &str, status: DisbursementStatus) -> String {
    format!(
        "{}{}",
        WEBHOOK_ID_PREFIX,
        short_hash(&format!("{}:{}", disbursement_id, status))
    )
}
