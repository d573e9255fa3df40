//! Request and response logging.

use std::any::Any;

use axum::body::{to_bytes, Body};
use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use crate::logging::format_body;

use super::{json_error, MAX_BODY_SIZE};

/// Turn a handler panic into a 500. The logging layer sees the response.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Handler panicked");

    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

/// Log every exchange with its bodies. Responses with status >= 400 log at
/// `warn`.
pub(crate) async fn log_exchange(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                route = %route,
                method = %method,
                path = %path,
                limit = MAX_BODY_SIZE,
                error = %e,
                "Request body rejected"
            );
            return json_error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
                .into_response();
        }
    };
    info!(
        route = %route,
        method = %method,
        path = %path,
        body = %format_body(&bytes),
        "Request"
    );

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                route = %route,
                method = %method,
                path = %path,
                error = %e,
                "Response read failed"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let status = parts.status.as_u16();
    if parts.status.is_client_error() || parts.status.is_server_error() {
        warn!(
            route = %route,
            method = %method,
            path = %path,
            status,
            body = %format_body(&bytes),
            "Response error"
        );
    } else {
        info!(
            route = %route,
            method = %method,
            path = %path,
            status,
            body = %format_body(&bytes),
            "Response success"
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}
