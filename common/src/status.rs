//! Canonical disbursement statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire value for a completed disbursement.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Wire value for a failed disbursement.
pub const STATUS_FAILED: &str = "FAILED";

/// Terminal state reported for a disbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisbursementStatus {
    /// Funds were delivered.
    Completed,
    /// Delivery failed.
    Failed,
}

impl DisbursementStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementStatus::Completed => STATUS_COMPLETED,
            DisbursementStatus::Failed => STATUS_FAILED,
        }
    }

    /// Check if this is the success state.
    pub fn is_completed(&self) -> bool {
        matches!(self, DisbursementStatus::Completed)
    }
}

impl fmt::Display for DisbursementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map any status string onto one of the two canonical statuses.
///
/// Only the exact strings `COMPLETED` and `FAILED` are recognized. Every
/// other value, including lowercase variants and empty strings, is reported
/// as `FAILED` so that externally visible statuses never leave the canonical
/// pair.
pub fn normalize_status(raw: &str) -> DisbursementStatus {
    match raw {
        STATUS_COMPLETED => DisbursementStatus::Completed,
        _ => DisbursementStatus::Failed,
    }
}
