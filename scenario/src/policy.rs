//! Outcome policies.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use paymock_common::{now, DisbursementRequest, DisbursementStatus};

use crate::definition::{Rule, ScenarioDefinition};
use crate::state::{EngineState, ScopeKey};

/// Which policy an engine was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Random,
    Default,
    Scenario,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Random => "random",
            PolicyKind::Default => "default",
            PolicyKind::Scenario => "scenario",
        };
        f.write_str(name)
    }
}

/// Strategy deciding one outcome per request.
///
/// Implementations run under the engine lock and must not block.
pub trait OutcomePolicy: Send {
    /// Policy identity.
    fn kind(&self) -> PolicyKind;

    /// Decide the outcome for a request, updating state as needed.
    fn pick(&mut self, request: &DisbursementRequest, state: &mut EngineState)
        -> DisbursementStatus;
}

/// Uniform coin flip.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Create a random policy, seeded for reproducible runs if a seed is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl OutcomePolicy for RandomPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Random
    }

    fn pick(
        &mut self,
        _request: &DisbursementRequest,
        _state: &mut EngineState,
    ) -> DisbursementStatus {
        if self.rng.gen_range(0..2) == 0 {
            DisbursementStatus::Completed
        } else {
            DisbursementStatus::Failed
        }
    }
}

/// Fails the first new external id of the process once.
///
/// The failure flag is global: whichever id arrives first takes the failure,
/// and every later id completes on its first attempt.
#[derive(Debug, Default)]
pub struct DefaultPolicy;

impl OutcomePolicy for DefaultPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Default
    }

    fn pick(
        &mut self,
        request: &DisbursementRequest,
        state: &mut EngineState,
    ) -> DisbursementStatus {
        if !state.mark_seen(&request.external_id) {
            return DisbursementStatus::Completed;
        }

        if state.claim_first_failure() {
            debug!(external_id = %request.external_id, "Issuing first failure");
            return DisbursementStatus::Failed;
        }

        DisbursementStatus::Completed
    }
}

/// Rule lists from a scenario definition.
pub struct ScenarioPolicy {
    definition: Arc<ScenarioDefinition>,
}

impl ScenarioPolicy {
    /// Create a policy over a loaded definition.
    pub fn new(definition: Arc<ScenarioDefinition>) -> Self {
        Self { definition }
    }

    /// Apply the rule pinned to the request's external id, or else the next
    /// unconsumed rule of the scope. Returns `None` once the scope is exhausted.
    fn apply_rules(
        request: &DisbursementRequest,
        rules: &[Rule],
        scope: &ScopeKey,
        state: &mut EngineState,
    ) -> Option<DisbursementStatus> {
        if let Some(rule) = rules.iter().find(|r| r.is_pinned_to(&request.external_id)) {
            debug!(scope = %scope, external_id = %request.external_id, "Pinned rule matched");
            return Some(Self::apply_rule(&request.external_id, rule, state));
        }

        let cursor = state.cursor(scope);
        let rule = rules.get(cursor)?;
        state.advance_cursor(scope, cursor);

        debug!(
            scope = %scope,
            external_id = %request.external_id,
            index = cursor,
            "Ordinal rule consumed"
        );
        Some(Self::apply_rule(&request.external_id, rule, state))
    }

    fn apply_rule(external_id: &str, rule: &Rule, state: &mut EngineState) -> DisbursementStatus {
        let attempt = state.record_attempt(external_id, now());
        let status = rule.status_for_attempt(attempt);

        debug!(
            external_id = %external_id,
            outcome = %rule.outcome,
            attempt,
            status = %status,
            "Rule applied"
        );
        status
    }
}

impl OutcomePolicy for ScenarioPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Scenario
    }

    fn pick(
        &mut self,
        request: &DisbursementRequest,
        state: &mut EngineState,
    ) -> DisbursementStatus {
        let batches = self
            .definition
            .batches
            .iter()
            .filter(|b| b.matches(&request.account_number, &request.description));
        for batch in batches {
            let scope = ScopeKey::batch(&batch.topup_id, &batch.account_number);
            if let Some(status) = Self::apply_rules(request, &batch.rules, &scope, state) {
                return status;
            }
        }

        let accounts = self
            .definition
            .accounts
            .iter()
            .filter(|a| a.account_number == request.account_number);
        for account in accounts {
            let scope = ScopeKey::account(&account.account_number);
            if let Some(status) = Self::apply_rules(request, &account.rules, &scope, state) {
                return status;
            }
        }

        DisbursementStatus::Completed
    }
}
