//! HTTP transport.
//!
//! Endpoints:
//! - POST     /xendit/disbursements     - Decide a disbursement and send its webhook
//! - POST     /xendit/simulate/success  - Same, always `COMPLETED`
//! - POST     /xendit/reset             - Forget all engine state
//! - GET|POST /xendit/healthz           - Liveness
//! - GET|POST /xendit/healthz-callback  - Probe the callback endpoint
//! - GET      /xendit/stats             - Engine mode and counters
//!
//! All responses use Content-Type: application/json.

mod decoder;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::service::DisbursementService;

pub use decoder::{decode_disbursement, DecodeError};

use self::handlers::{
    handle_callback_health, handle_create_disbursement, handle_health, handle_not_found,
    handle_reset, handle_simulate_success, handle_stats,
};
use self::middleware::{log_exchange, panic_response};

pub(crate) type SharedService = Arc<DisbursementService>;

/// Largest request body accepted: 2 MiB.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the gateway router.
pub fn router(service: Arc<DisbursementService>) -> Router {
    let routes = Router::new()
        .route("/xendit/disbursements", post(handle_create_disbursement))
        .route("/xendit/simulate/success", post(handle_simulate_success))
        .route("/xendit/reset", post(handle_reset))
        .route("/xendit/healthz", get(handle_health).post(handle_health))
        .route(
            "/xendit/healthz-callback",
            get(handle_callback_health).post(handle_callback_health),
        )
        .route("/xendit/stats", get(handle_stats))
        .fallback(handle_not_found);

    with_middleware(routes).with_state(service)
}

/// Wrap routes with panic recovery and exchange logging, logging outermost.
fn with_middleware<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum_middleware::from_fn(log_exchange))
}

/// Serve the gateway until Ctrl+C.
pub async fn serve(config: &GatewayConfig, service: Arc<DisbursementService>) -> GatewayResult<()> {
    let addr = format!("{}:{}", config.listen_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
