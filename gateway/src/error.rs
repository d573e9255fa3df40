//! Gateway error types.

use thiserror::Error;

/// Errors from delivering a webhook.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// No callback URL is configured.
    #[error("CALLBACK_URL is not set")]
    MissingUrl,

    /// The payload could not be encoded.
    #[error("Failed to encode callback payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request could not be delivered.
    #[error("Callback request failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The response arrived but its body could not be read.
    #[error("Callback response read failed: {0}")]
    ReadBody(#[source] ureq::Error),

    /// The blocking request task did not complete.
    #[error("Callback task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for webhook delivery.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Errors raised while configuring or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listener or socket failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
