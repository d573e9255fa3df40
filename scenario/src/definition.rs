//! Scenario definition schema and loader.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use paymock_common::{null_as_default, DisbursementStatus};

use crate::error::ScenarioResult;

/// Retry window applied when the file leaves it unset, null or zero.
pub const DEFAULT_RETRY_TIMEOUT_MINUTES: i64 = 60;

/// Declarative description of the outcomes to report per account and batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDefinition {
    /// Informational retry window for `fail_until_timeout` rules.
    #[serde(deserialize_with = "null_as_default")]
    pub retry_timeout_minutes: i64,
    /// Rules keyed by account number.
    #[serde(deserialize_with = "null_as_default")]
    pub accounts: Vec<AccountScenario>,
    /// Rules keyed by topup id and account number. Checked before accounts.
    #[serde(deserialize_with = "null_as_default")]
    pub batches: Vec<BatchScenario>,
}

/// Ordered rules for every disbursement to one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountScenario {
    #[serde(deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(rename = "disbursements", deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
}

/// Ordered rules for disbursements to one account within a topup batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchScenario {
    /// Matched against the request description. Empty matches any batch.
    #[serde(deserialize_with = "null_as_default")]
    pub topup_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(rename = "disbursements", deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
}

impl BatchScenario {
    /// Check if this batch applies to a request.
    pub fn matches(&self, account_number: &str, description: &str) -> bool {
        self.account_number == account_number
            && (self.topup_id.is_empty() || self.topup_id == description)
    }
}

/// A single outcome rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Pins the rule to one external id. Empty rules are consumed in order.
    #[serde(deserialize_with = "null_as_default")]
    pub external_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub outcome: Outcome,
    /// Number of failed attempts before `fail_then_succeed` completes.
    #[serde(deserialize_with = "null_as_default")]
    pub retry_success_at: i64,
}

impl Rule {
    /// Check if this rule is pinned to the given external id.
    pub fn is_pinned_to(&self, external_id: &str) -> bool {
        !self.external_id.is_empty() && self.external_id == external_id
    }

    /// Status reported on the given attempt (1-based) for this rule.
    pub fn status_for_attempt(&self, attempt: u32) -> DisbursementStatus {
        match &self.outcome {
            Outcome::Success => DisbursementStatus::Completed,
            Outcome::FailThenSucceed => {
                if self.retry_success_at > 0 && i64::from(attempt) > self.retry_success_at {
                    DisbursementStatus::Completed
                } else {
                    DisbursementStatus::Failed
                }
            }
            Outcome::FailUntilTimeout => DisbursementStatus::Failed,
            Outcome::Unknown(_) => DisbursementStatus::Completed,
        }
    }
}

/// Outcome named by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    /// Complete on every attempt.
    Success,
    /// Fail until the attempt count passes `retry_success_at`.
    FailThenSucceed,
    /// Fail on every attempt.
    FailUntilTimeout,
    /// Unrecognized value, kept verbatim. Completes.
    Unknown(String),
}

impl Outcome {
    /// Wire name of the outcome.
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Success => "success",
            Outcome::FailThenSucceed => "fail_then_succeed",
            Outcome::FailUntilTimeout => "fail_until_timeout",
            Outcome::Unknown(raw) => raw,
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Unknown(String::new())
    }
}

impl From<String> for Outcome {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "success" => Outcome::Success,
            "fail_then_succeed" => Outcome::FailThenSucceed,
            "fail_until_timeout" => Outcome::FailUntilTimeout,
            _ => Outcome::Unknown(raw),
        }
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScenarioDefinition {
    /// Parse a scenario document and fill defaults.
    pub fn parse(data: &[u8]) -> ScenarioResult<Self> {
        let mut definition: ScenarioDefinition = serde_json::from_slice(data)?;
        if definition.retry_timeout_minutes == 0 {
            definition.retry_timeout_minutes = DEFAULT_RETRY_TIMEOUT_MINUTES;
        }
        Ok(definition)
    }

    /// Total number of rules across accounts and batches.
    pub fn rule_count(&self) -> usize {
        self.accounts.iter().map(|a| a.rules.len()).sum::<usize>()
            + self.batches.iter().map(|b| b.rules.len()).sum::<usize>()
    }
}

/// Read and parse a scenario file.
pub fn load(path: impl AsRef<Path>) -> ScenarioResult<ScenarioDefinition> {
    let data = std::fs::read(path.as_ref())?;
    ScenarioDefinition::parse(&data)
}

/// Load a scenario file if one is configured.
///
/// Returns `None` when no path is given or the file cannot be read or
/// parsed; the engine then falls back to its default policy.
pub fn load_optional(path: Option<&str>) -> Option<ScenarioDefinition> {
    let path = path.filter(|p| !p.is_empty())?;

    match load(path) {
        Ok(definition) => {
            info!(
                path = %path,
                accounts = definition.accounts.len(),
                batches = definition.batches.len(),
                rules = definition.rule_count(),
                retry_timeout_minutes = definition.retry_timeout_minutes,
                "Scenario loaded"
            );
            Some(definition)
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Ignoring scenario file");
            None
        }
    }
}
