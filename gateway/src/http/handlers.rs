//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::error::CallbackError;
use crate::service::DisbursementOutcome;

use super::decoder::decode_disbursement;
use super::{json_error, SharedService};

/// Fallback for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET|POST /xendit/healthz
pub(crate) async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// GET|POST /xendit/healthz-callback
pub(crate) async fn handle_callback_health(State(service): State<SharedService>) -> Response {
    let status = match service.probe_callback().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Callback health check failed");
            match e {
                CallbackError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                CallbackError::MissingUrl
                | CallbackError::ReadBody(_)
                | CallbackError::Serialize(_)
                | CallbackError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    };

    let body = if status == StatusCode::OK { "ok" } else { "error" };
    (status, Json(json!({"status": body}))).into_response()
}

/// POST /xendit/disbursements
pub(crate) async fn handle_create_disbursement(
    State(service): State<SharedService>,
    body: Bytes,
) -> Response {
    let request = match decode_disbursement(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = ?e, "Disbursement decode failed");
            return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
        }
    };

    respond(service.create(request).await)
}

/// POST /xendit/simulate/success
pub(crate) async fn handle_simulate_success(
    State(service): State<SharedService>,
    body: Bytes,
) -> Response {
    let request = match decode_disbursement(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = ?e, "Simulated disbursement decode failed");
            return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
        }
    };

    respond(service.simulate_success(request).await)
}

/// POST /xendit/reset
pub(crate) async fn handle_reset(State(service): State<SharedService>) -> impl IntoResponse {
    service.reset();
    (StatusCode::OK, Json(json!({"status": "reset"})))
}

/// GET /xendit/stats
pub(crate) async fn handle_stats(State(service): State<SharedService>) -> impl IntoResponse {
    (StatusCode::OK, Json(service.stats()))
}

// Callback failures are already logged by the service and never change the answer.
fn respond(outcome: DisbursementOutcome) -> Response {
    (StatusCode::OK, Json(outcome.response)).into_response()
}
