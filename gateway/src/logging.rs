//! Tracing setup and body rendering for logs.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{GatewayConfig, LogFormat};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level.
pub fn init_tracing(config: &GatewayConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Render a body for logging: `{empty}`, pretty-printed JSON, or raw text.
pub fn format_body(body: &[u8]) -> String {
    if body.iter().all(u8::is_ascii_whitespace) {
        return "{empty}".to_string();
    }

    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}
