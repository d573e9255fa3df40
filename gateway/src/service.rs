//! Disbursement handling independent of the HTTP layer.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use paymock_common::{
    format_rfc3339, normalize_status, now, CallbackPayload, DisbursementRequest,
    DisbursementResponse, DisbursementStatus,
};
use paymock_scenario::OutcomeEngine;

use crate::callback::{CallbackSender, ProbeResponse};
use crate::error::{CallbackError, CallbackResult};
use crate::metrics::{MetricsSnapshot, ServiceMetrics};

/// Result of handling one disbursement.
///
/// A failed webhook never changes the response; it is reported alongside it.
#[derive(Debug)]
pub struct DisbursementOutcome {
    pub response: DisbursementResponse,
    pub callback_error: Option<CallbackError>,
}

/// Engine mode and counters.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub policy: String,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}

/// Decides disbursements and reports them through webhooks.
pub struct DisbursementService {
    engine: Arc<OutcomeEngine>,
    callbacks: Arc<dyn CallbackSender>,
    user_id: String,
    metrics: ServiceMetrics,
}

impl DisbursementService {
    /// Create a service.
    pub fn new(
        engine: Arc<OutcomeEngine>,
        callbacks: Arc<dyn CallbackSender>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            callbacks,
            user_id: user_id.into(),
            metrics: ServiceMetrics::new(),
        }
    }

    /// Decide a disbursement with the engine and deliver its webhook.
    pub async fn create(&self, request: DisbursementRequest) -> DisbursementOutcome {
        let status = normalize_status(self.engine.pick_status(&request).as_str());
        info!(
            external_id = %request.external_id,
            account_number = %request.account_number,
            status = %status,
            "Disbursement decided"
        );

        if let Some(deadline) = self.engine.retry_deadline(&request.external_id) {
            debug!(
                external_id = %request.external_id,
                retry_deadline = %format_rfc3339(deadline),
                elapsed = now() >= deadline,
                "Retry window"
            );
        }

        self.respond(request, status).await
    }

    /// Answer a disbursement `COMPLETED` without consulting the engine.
    pub async fn simulate_success(&self, request: DisbursementRequest) -> DisbursementOutcome {
        info!(external_id = %request.external_id, "Simulating successful disbursement");
        self.respond(request, DisbursementStatus::Completed).await
    }

    async fn respond(
        &self,
        request: DisbursementRequest,
        status: DisbursementStatus,
    ) -> DisbursementOutcome {
        self.metrics.disbursement(status);

        let response = DisbursementResponse::build(&request, status, &self.user_id);
        let payload = CallbackPayload::build(&request, status, &self.user_id);

        let callback_error = match self.callbacks.send(&payload).await {
            Ok(()) => {
                self.metrics.callback(true);
                None
            }
            Err(e) => {
                warn!(external_id = %request.external_id, error = %e, "Callback failed");
                self.metrics.callback(false);
                Some(e)
            }
        };

        DisbursementOutcome {
            response,
            callback_error,
        }
    }

    /// Reset engine state.
    pub fn reset(&self) {
        self.engine.reset();
        self.metrics.reset();
    }

    /// Probe the callback endpoint.
    pub async fn probe_callback(&self) -> CallbackResult<ProbeResponse> {
        self.callbacks.probe().await
    }

    /// Engine mode and counters.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            policy: self.engine.policy_kind().to_string(),
            counters: self.metrics.snapshot(),
        }
    }
}
