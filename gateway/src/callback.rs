//! Webhook delivery to the system under test.
//!
//! `ureq` is synchronous, so every request runs on tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use paymock_common::CallbackPayload;

use crate::config::CallbackConfig;
use crate::error::{CallbackError, CallbackResult};
use crate::logging::format_body;

/// Status and body returned by the callback endpoint to a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Delivers webhooks for decided disbursements.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    /// Deliver one webhook.
    async fn send(&self, payload: &CallbackPayload) -> CallbackResult<()>;

    /// Post an empty body to the callback endpoint and report what came back.
    async fn probe(&self) -> CallbackResult<ProbeResponse>;
}

/// Response status plus the outcome of reading its body.
type Exchange = (u16, Result<Vec<u8>, ureq::Error>);

/// HTTP webhook client.
#[derive(Clone)]
pub struct HttpCallbackClient {
    url: Arc<str>,
    token: Option<Arc<str>>,
    agent: ureq::Agent,
}

impl HttpCallbackClient {
    /// Create a client for the given URL. An empty URL makes every call fail
    /// with [`CallbackError::MissingUrl`].
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            url: Arc::from(url.into()),
            token: token.filter(|t| !t.is_empty()).map(Arc::from),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Create a client from gateway configuration.
    pub fn from_config(config: &CallbackConfig) -> Self {
        Self::new(config.url.clone(), config.token.clone(), config.timeout)
    }

    /// Configured callback URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn ensure_url(&self) -> CallbackResult<()> {
        if self.url.is_empty() {
            return Err(CallbackError::MissingUrl);
        }
        Ok(())
    }

    /// POST `body` and return the status with the raw response body result.
    async fn post(&self, body: Vec<u8>) -> CallbackResult<Exchange> {
        let client = self.clone();

        tokio::task::spawn_blocking(move || -> CallbackResult<Exchange> {
            let mut request = client
                .agent
                .post(client.url.as_ref())
                .header("Content-Type", "application/json");

            match &client.token {
                Some(token) => request = request.header("X-Callback-Token", token.as_ref()),
                None => warn!("CALLBACK_TOKEN is not set, sending callback without token"),
            }

            let mut response = if body.is_empty() {
                request.send_empty()?
            } else {
                request.send(&body[..])?
            };

            let status = response.status().as_u16();
            let read = response.body_mut().read_to_vec();
            Ok((status, read))
        })
        .await?
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackClient {
    async fn send(&self, payload: &CallbackPayload) -> CallbackResult<()> {
        self.ensure_url()?;

        let body = serde_json::to_vec(payload)?;
        info!(
            url = %self.url,
            external_id = %payload.external_id,
            status = %payload.status,
            body = %format_body(&body),
            "Sending callback"
        );

        let (status, read) = self.post(body).await?;
        match read {
            Ok(response) => {
                if (200..300).contains(&status) {
                    info!(status, body = %format_body(&response), "Callback response");
                } else {
                    warn!(status, body = %format_body(&response), "Callback rejected");
                }
            }
            Err(e) => warn!(status, error = %e, "Callback response read failed"),
        }

        Ok(())
    }

    async fn probe(&self) -> CallbackResult<ProbeResponse> {
        self.ensure_url()?;

        let (status, read) = self.post(Vec::new()).await?;
        let body = read.map_err(CallbackError::ReadBody)?;
        info!(status, body = %format_body(&body), "Callback probe response");

        Ok(ProbeResponse { status, body })
    }
}

/// Records webhooks in memory instead of sending them.
#[derive(Default)]
pub struct MemoryCallbackSender {
    sent: Mutex<Vec<CallbackPayload>>,
    fail: bool,
}

impl MemoryCallbackSender {
    /// Create a sender that accepts every webhook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender that rejects every webhook with
    /// [`CallbackError::MissingUrl`].
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Webhooks delivered so far.
    pub fn sent(&self) -> Vec<CallbackPayload> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl CallbackSender for MemoryCallbackSender {
    async fn send(&self, payload: &CallbackPayload) -> CallbackResult<()> {
        if self.fail {
            return Err(CallbackError::MissingUrl);
        }
        self.sent.lock().push(payload.clone());
        Ok(())
    }

    async fn probe(&self) -> CallbackResult<ProbeResponse> {
        if self.fail {
            return Err(CallbackError::MissingUrl);
        }
        Ok(ProbeResponse {
            status: 200,
            body: Vec::new(),
        })
    }
}
