//! Counters for gateway activity.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use paymock_common::DisbursementStatus;

/// Gateway counters.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Disbursements answered, including simulated successes.
    pub disbursements_total: AtomicU64,
    /// Disbursements answered `COMPLETED`.
    pub disbursements_completed: AtomicU64,
    /// Disbursements answered `FAILED`.
    pub disbursements_failed: AtomicU64,
    /// Webhooks delivered.
    pub callbacks_delivered: AtomicU64,
    /// Webhooks that could not be delivered.
    pub callbacks_failed: AtomicU64,
    /// Engine resets.
    pub resets: AtomicU64,
}

impl ServiceMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answered disbursement.
    pub fn disbursement(&self, status: DisbursementStatus) {
        self.disbursements_total.fetch_add(1, Ordering::Relaxed);
        if status.is_completed() {
            self.disbursements_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.disbursements_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a webhook delivery attempt.
    pub fn callback(&self, delivered: bool) {
        if delivered {
            self.callbacks_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.callbacks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an engine reset.
    pub fn reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            disbursements_total: self.disbursements_total.load(Ordering::Relaxed),
            disbursements_completed: self.disbursements_completed.load(Ordering::Relaxed),
            disbursements_failed: self.disbursements_failed.load(Ordering::Relaxed),
            callbacks_delivered: self.callbacks_delivered.load(Ordering::Relaxed),
            callbacks_failed: self.callbacks_failed.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub disbursements_total: u64,
    pub disbursements_completed: u64,
    pub disbursements_failed: u64,
    pub callbacks_delivered: u64,
    pub callbacks_failed: u64,
    pub resets: u64,
}
