//! Gateway configuration.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Webhook delivery configuration.
#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// Full URL webhooks are posted to. Empty disables delivery.
    pub url: String,
    /// Value of the `X-Callback-Token` header.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Main gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub port: u16,
    /// Scenario file driving outcomes. None uses the default policy.
    pub scenario_file: Option<String>,
    /// Report uniformly random outcomes.
    pub random_status: bool,
    /// Seed for random outcomes.
    pub random_seed: Option<u64>,
    /// Webhook delivery.
    pub callback: CallbackConfig,
    /// `user_id` reported in responses and webhooks.
    pub user_id: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8080,
            scenario_file: None,
            random_status: false,
            random_seed: None,
            callback: CallbackConfig::default(),
            user_id: "user_mock".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = var("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = var("PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        config.scenario_file = var("SCENARIO_FILE");

        if let Some(random) = var("RANDOM_STATUS") {
            config.random_status = parse_flag(&random);
        }

        if let Some(seed) = var("RANDOM_SEED") {
            config.random_seed = seed.parse().ok();
        }

        if let Some(url) = var("CALLBACK_URL") {
            config.callback.url = url;
        }

        config.callback.token = var("CALLBACK_TOKEN");

        if let Some(secs) = var("CALLBACK_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.callback.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(user_id) = var("XENDIT_USER_ID") {
            config.user_id = user_id;
        }

        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(format) = var("LOG_FORMAT") {
            if format.eq_ignore_ascii_case("json") {
                config.log_format = LogFormat::Json;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.port == 0 {
            return Err(GatewayError::Config("Listen port cannot be 0".to_string()));
        }

        if self.listen_addr.is_empty() {
            return Err(GatewayError::Config("Listen address cannot be empty".to_string()));
        }

        if self.user_id.is_empty() {
            return Err(GatewayError::Config("User id cannot be empty".to_string()));
        }

        if self.callback.timeout.is_zero() {
            return Err(GatewayError::Config("Callback timeout cannot be zero".to_string()));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load `KEY=VALUE` lines from a dotenv file into the process environment.
///
/// Variables that are already set win. Blank lines, `#` comments, lines
/// without `=` and entries with an empty key or value are skipped. Returns
/// the number of variables set; a missing file sets none.
pub fn load_dotenv(path: impl AsRef<Path>) -> usize {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No dotenv file loaded");
            return 0;
        }
    };

    let mut loaded = 0;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }

        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
            loaded += 1;
        }
    }

    loaded
}
