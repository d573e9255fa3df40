//! Mutable decision state.

use std::collections::{HashMap, HashSet};
use std::fmt;

use paymock_common::Timestamp;

/// Identity of a rule list whose ordinal cursor is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Rules of a batch. An empty topup id is its own scope.
    Batch {
        topup_id: String,
        account_number: String,
    },
    /// Rules of an account.
    Account { account_number: String },
}

impl ScopeKey {
    /// Scope of a batch.
    pub fn batch(topup_id: impl Into<String>, account_number: impl Into<String>) -> Self {
        ScopeKey::Batch {
            topup_id: topup_id.into(),
            account_number: account_number.into(),
        }
    }

    /// Scope of an account.
    pub fn account(account_number: impl Into<String>) -> Self {
        ScopeKey::Account {
            account_number: account_number.into(),
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Batch {
                topup_id,
                account_number,
            } => write!(f, "batch:{}:{}", topup_id, account_number),
            ScopeKey::Account { account_number } => write!(f, "account:{}", account_number),
        }
    }
}

/// Everything the engine remembers between decisions.
///
/// Only the engine touches this, and only while holding its lock.
#[derive(Debug, Default)]
pub struct EngineState {
    /// External ids seen by the default policy.
    seen: HashSet<String>,
    /// Whether the default policy has issued its one failure.
    first_failure_issued: bool,
    /// Rule applications per external id.
    attempts: HashMap<String, u32>,
    /// Time of the first rule application per external id.
    first_attempt: HashMap<String, Timestamp>,
    /// Next unconsumed rule index per scope.
    cursors: HashMap<ScopeKey, usize>,
}

impl EngineState {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an external id as seen. Returns false if it already was.
    pub fn mark_seen(&mut self, external_id: &str) -> bool {
        self.seen.insert(external_id.to_string())
    }

    /// Claim the one-time global failure. Returns true only on the first call.
    pub fn claim_first_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.first_failure_issued, true)
    }

    /// Record a rule application and return the new attempt count.
    pub fn record_attempt(&mut self, external_id: &str, at: Timestamp) -> u32 {
        let count = self.attempts.entry(external_id.to_string()).or_insert(0);
        if *count == 0 {
            self.first_attempt.insert(external_id.to_string(), at);
        }
        *count += 1;
        *count
    }

    /// Attempts recorded for an external id.
    pub fn attempts(&self, external_id: &str) -> u32 {
        self.attempts.get(external_id).copied().unwrap_or(0)
    }

    /// Time of the first attempt for an external id.
    pub fn first_attempt_at(&self, external_id: &str) -> Option<Timestamp> {
        self.first_attempt.get(external_id).copied()
    }

    /// Next unconsumed rule index for a scope.
    pub fn cursor(&self, scope: &ScopeKey) -> usize {
        self.cursors.get(scope).copied().unwrap_or(0)
    }

    /// Consume the rule at `index` for a scope.
    pub fn advance_cursor(&mut self, scope: &ScopeKey, index: usize) {
        let cursor = self.cursors.entry(scope.clone()).or_insert(0);
        *cursor = (*cursor).max(index + 1);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
impl EngineState {
    pub(crate) fn is_empty(&self) -> bool {
        self.seen.is_empty()
            && !self.first_failure_issued
            && self.attempts.is_empty()
            && self.first_attempt.is_empty()
            && self.cursors.is_empty()
    }

    /// Cross-field invariants. Exact when every id is new and no rule is
    /// pinned, so each consumed rule is one attempt.
    pub(crate) fn is_consistent(&self) -> bool {
        let attempts: u32 = self.attempts.values().sum();
        let consumed: usize = self.cursors.values().sum();
        self.attempts.len() == self.first_attempt.len()
            && attempts as usize == consumed
            && (self.first_failure_issued || self.seen.is_empty())
    }
}
