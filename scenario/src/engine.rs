//! Outcome decision engine.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use paymock_common::{window_end, DisbursementRequest, DisbursementStatus, Timestamp};

use crate::definition::ScenarioDefinition;
use crate::policy::{DefaultPolicy, OutcomePolicy, PolicyKind, RandomPolicy, ScenarioPolicy};
use crate::state::{EngineState, ScopeKey};

struct EngineInner {
    state: EngineState,
    policy: Box<dyn OutcomePolicy>,
}

/// Shared engine deciding the outcome of each disbursement.
///
/// All state and the policy live behind one mutex, so decisions and resets
/// from concurrent requests are applied in a single total order.
pub struct OutcomeEngine {
    inner: Mutex<EngineInner>,
    scenario: Option<Arc<ScenarioDefinition>>,
    kind: PolicyKind,
}

impl OutcomeEngine {
    /// Create an engine. Random mode takes precedence over a scenario.
    pub fn new(scenario: Option<ScenarioDefinition>, random: bool) -> Self {
        Self::with_seed(scenario, random, None)
    }

    /// Create an engine whose random mode uses a fixed seed.
    pub fn with_seed(
        scenario: Option<ScenarioDefinition>,
        random: bool,
        seed: Option<u64>,
    ) -> Self {
        let scenario = scenario.map(Arc::new);

        let policy: Box<dyn OutcomePolicy> = if random {
            Box::new(RandomPolicy::new(seed))
        } else {
            match &scenario {
                Some(definition) => Box::new(ScenarioPolicy::new(definition.clone())),
                None => Box::new(DefaultPolicy),
            }
        };
        let kind = policy.kind();

        info!(policy = %kind, "Outcome engine created");

        Self {
            inner: Mutex::new(EngineInner {
                state: EngineState::new(),
                policy,
            }),
            scenario,
            kind,
        }
    }

    /// Decide the outcome of a request. Never fails.
    pub fn pick_status(&self, request: &DisbursementRequest) -> DisbursementStatus {
        let mut inner = self.inner.lock();
        let EngineInner { state, policy } = &mut *inner;
        policy.pick(request, state)
    }

    /// Forget all decisions. The scenario definition is kept.
    pub fn reset(&self) {
        self.inner.lock().state.clear();
        info!(policy = %self.kind, "Outcome engine reset");
    }

    /// Policy selected at construction.
    pub fn policy_kind(&self) -> PolicyKind {
        self.kind
    }

    /// Loaded scenario, if any.
    pub fn scenario(&self) -> Option<&ScenarioDefinition> {
        self.scenario.as_deref()
    }

    /// Rule applications recorded for an external id.
    pub fn attempts(&self, external_id: &str) -> u32 {
        self.inner.lock().state.attempts(external_id)
    }

    /// Time of the first rule application for an external id.
    pub fn first_attempt_at(&self, external_id: &str) -> Option<Timestamp> {
        self.inner.lock().state.first_attempt_at(external_id)
    }

    /// End of the scenario's retry window for an external id.
    ///
    /// The engine itself never enforces this; callers that want
    /// `fail_until_timeout` to lapse compare it against the clock.
    pub fn retry_deadline(&self, external_id: &str) -> Option<Timestamp> {
        let minutes = self.scenario.as_ref()?.retry_timeout_minutes;
        self.first_attempt_at(external_id)
            .and_then(|start| window_end(start, minutes))
    }

    /// Next unconsumed rule index for a scope.
    pub fn cursor(&self, scope: &ScopeKey) -> usize {
        self.inner.lock().state.cursor(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AccountScenario, BatchScenario, Outcome, Rule};
    use chrono::Duration;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn request(external_id: &str, account_number: &str, description: &str) -> DisbursementRequest {
        DisbursementRequest {
            external_id: external_id.to_string(),
            account_number: account_number.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn rule(external_id: &str, outcome: Outcome, retry_success_at: i64) -> Rule {
        Rule {
            external_id: external_id.to_string(),
            outcome,
            retry_success_at,
        }
    }

    fn account(account_number: &str, rules: Vec<Rule>) -> AccountScenario {
        AccountScenario {
            account_number: account_number.to_string(),
            rules,
        }
    }

    fn batch(topup_id: &str, account_number: &str, rules: Vec<Rule>) -> BatchScenario {
        BatchScenario {
            topup_id: topup_id.to_string(),
            account_number: account_number.to_string(),
            rules,
        }
    }

    fn scenario(accounts: Vec<AccountScenario>, batches: Vec<BatchScenario>) -> ScenarioDefinition {
        ScenarioDefinition {
            retry_timeout_minutes: 60,
            accounts,
            batches,
        }
    }

    #[test]
    fn test_policy_selection() {
        assert_eq!(OutcomeEngine::new(None, false).policy_kind(), PolicyKind::Default);
        assert_eq!(
            OutcomeEngine::new(Some(scenario(vec![], vec![])), false).policy_kind(),
            PolicyKind::Scenario
        );
        assert_eq!(
            OutcomeEngine::new(Some(scenario(vec![], vec![])), true).policy_kind(),
            PolicyKind::Random
        );
    }

    #[test]
    fn test_default_policy_first_failure_is_global() {
        // One failure for the whole process, not one per external id.
        let engine = OutcomeEngine::new(None, false);

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Failed);
        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.pick_status(&request("ext-2", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.pick_status(&request("ext-3", "B", "")), DisbursementStatus::Completed);
    }

    #[test]
    fn test_reset_restores_first_failure() {
        let engine = OutcomeEngine::new(None, false);
        engine.pick_status(&request("ext-1", "A", ""));
        engine.pick_status(&request("ext-2", "A", ""));

        engine.reset();

        assert_eq!(engine.pick_status(&request("ext-2", "A", "")), DisbursementStatus::Failed);
        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
    }

    #[test]
    fn test_pinned_rule_does_not_advance_cursor() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account(
                    "A",
                    vec![
                        rule("ext-1", Outcome::Success, 0),
                        rule("", Outcome::FailUntilTimeout, 0),
                    ],
                )],
                vec![],
            )),
            false,
        );
        let scope = ScopeKey::account("A");

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.cursor(&scope), 0);

        // Unpinned request starts at index 0, which is the pinned success rule.
        assert_eq!(engine.pick_status(&request("ext-9", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.cursor(&scope), 1);
        assert_eq!(engine.pick_status(&request("ext-10", "A", "")), DisbursementStatus::Failed);
        assert_eq!(engine.cursor(&scope), 2);
    }

    #[test]
    fn test_ordinal_rules_consumed_once_per_request() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::FailThenSucceed, 1)])],
                vec![],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Failed);
        // Scope exhausted: falls through to the final default.
        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.pick_status(&request("ext-2", "A", "")), DisbursementStatus::Completed);

        assert_eq!(engine.cursor(&ScopeKey::account("A")), 1);
        assert_eq!(engine.attempts("ext-1"), 1);
        assert_eq!(engine.attempts("ext-2"), 0);
    }

    #[test]
    fn test_pinned_fail_then_succeed_retries() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("ext-1", Outcome::FailThenSucceed, 1)])],
                vec![],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Failed);
        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.attempts("ext-1"), 2);
    }

    #[test]
    fn test_fail_then_succeed_after_n_failures() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("ext-1", Outcome::FailThenSucceed, 3)])],
                vec![],
            )),
            false,
        );

        let statuses: Vec<_> = (0..5)
            .map(|_| engine.pick_status(&request("ext-1", "A", "")))
            .collect();

        assert_eq!(
            statuses,
            vec![
                DisbursementStatus::Failed,
                DisbursementStatus::Failed,
                DisbursementStatus::Failed,
                DisbursementStatus::Completed,
                DisbursementStatus::Completed,
            ]
        );
    }

    #[test]
    fn test_fail_until_timeout_always_fails() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("ext-1", Outcome::FailUntilTimeout, 1)])],
                vec![],
            )),
            false,
        );

        for _ in 0..10 {
            assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Failed);
        }
        assert_eq!(engine.attempts("ext-1"), 10);
    }

    #[test]
    fn test_unknown_outcome_completes() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::Unknown("weird".to_string()), 0)])],
                vec![],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Completed);
        assert_eq!(engine.attempts("ext-1"), 1);
    }

    #[test]
    fn test_batch_takes_precedence_over_account() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::Success, 0)])],
                vec![batch("T", "A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "T")), DisbursementStatus::Failed);
        assert_eq!(engine.cursor(&ScopeKey::batch("T", "A")), 1);
        assert_eq!(engine.cursor(&ScopeKey::account("A")), 0);

        // Batch exhausted: the account rules apply next.
        assert_eq!(engine.pick_status(&request("ext-2", "A", "T")), DisbursementStatus::Completed);
        assert_eq!(engine.cursor(&ScopeKey::account("A")), 1);
    }

    #[test]
    fn test_batch_requires_matching_topup() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![],
                vec![batch("T", "A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
            )),
            false,
        );

        assert_eq!(
            engine.pick_status(&request("ext-1", "A", "other")),
            DisbursementStatus::Completed
        );
        assert_eq!(engine.cursor(&ScopeKey::batch("T", "A")), 0);
        assert_eq!(engine.attempts("ext-1"), 0);
    }

    #[test]
    fn test_batch_with_empty_topup_matches_any_description() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![],
                vec![batch("", "A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
            )),
            false,
        );

        assert_eq!(
            engine.pick_status(&request("ext-1", "A", "anything")),
            DisbursementStatus::Failed
        );
        assert_eq!(engine.cursor(&ScopeKey::batch("", "A")), 1);
    }

    #[test]
    fn test_exhausted_batch_falls_to_next_matching_batch() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![],
                vec![
                    batch("T", "A", vec![rule("", Outcome::Success, 0)]),
                    batch("", "A", vec![rule("", Outcome::FailUntilTimeout, 0)]),
                ],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "T")), DisbursementStatus::Completed);
        assert_eq!(engine.pick_status(&request("ext-2", "A", "T")), DisbursementStatus::Failed);
        assert_eq!(engine.pick_status(&request("ext-3", "A", "T")), DisbursementStatus::Completed);
    }

    #[test]
    fn test_unmatched_account_completes() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
                vec![],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "Z", "")), DisbursementStatus::Completed);
        assert_eq!(engine.attempts("ext-1"), 0);
    }

    #[test]
    fn test_reset_rewinds_scenario_cursors() {
        let engine = OutcomeEngine::new(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
                vec![],
            )),
            false,
        );

        assert_eq!(engine.pick_status(&request("ext-1", "A", "")), DisbursementStatus::Failed);
        assert_eq!(engine.pick_status(&request("ext-2", "A", "")), DisbursementStatus::Completed);

        engine.reset();

        assert_eq!(engine.cursor(&ScopeKey::account("A")), 0);
        assert_eq!(engine.attempts("ext-1"), 0);
        assert!(engine.first_attempt_at("ext-1").is_none());
        assert_eq!(engine.pick_status(&request("ext-2", "A", "")), DisbursementStatus::Failed);
        assert!(engine.scenario().is_some());
    }

    #[test]
    fn test_retry_deadline_follows_first_attempt() {
        let engine = OutcomeEngine::new(
            Some(ScenarioDefinition {
                retry_timeout_minutes: 15,
                accounts: vec![account("A", vec![rule("ext-1", Outcome::FailUntilTimeout, 0)])],
                batches: vec![],
            }),
            false,
        );

        assert!(engine.retry_deadline("ext-1").is_none());

        engine.pick_status(&request("ext-1", "A", ""));
        let first = engine.first_attempt_at("ext-1").unwrap();
        engine.pick_status(&request("ext-1", "A", ""));

        assert_eq!(engine.first_attempt_at("ext-1"), Some(first));
        assert_eq!(engine.retry_deadline("ext-1"), Some(first + Duration::minutes(15)));
    }

    #[test]
    fn test_random_mode_ignores_scenario() {
        let engine = OutcomeEngine::with_seed(
            Some(scenario(
                vec![account("A", vec![rule("", Outcome::FailUntilTimeout, 0)])],
                vec![],
            )),
            true,
            Some(1),
        );

        for i in 0..20 {
            engine.pick_status(&request(&format!("ext-{}", i), "A", ""));
        }

        assert_eq!(engine.cursor(&ScopeKey::account("A")), 0);
        assert_eq!(engine.attempts("ext-0"), 0);
    }

    #[test]
    fn test_concurrent_default_decisions_fail_once() {
        let engine = Arc::new(OutcomeEngine::new(None, false));

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let engine = engine.clone();
                thread::spawn(move || {
                    (0..50)
                        .map(|i| engine.pick_status(&request(&format!("ext-{}-{}", t, i), "A", "")))
                        .filter(|s| *s == DisbursementStatus::Failed)
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_concurrent_ordinal_consumption_is_linearizable() {
        let rules: Vec<_> = (0..40)
            .map(|_| rule("", Outcome::FailUntilTimeout, 0))
            .collect();
        let engine = Arc::new(OutcomeEngine::new(
            Some(scenario(vec![account("A", rules)], vec![])),
            false,
        ));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = engine.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|i| {
                            let id = format!("ext-{}-{}", t, i);
                            (id.clone(), engine.pick_status(&request(&id, "A", "")))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        // Exactly one request per rule, each rule consumed by a distinct id.
        let failed: HashSet<_> = results
            .iter()
            .filter(|(_, s)| *s == DisbursementStatus::Failed)
            .map(|(id, _)| id.clone())
            .collect();
        assert_eq!(failed.len(), 40);
        assert_eq!(results.len() - failed.len(), 40);
        assert_eq!(engine.cursor(&ScopeKey::account("A")), 40);
        for id in &failed {
            assert_eq!(engine.attempts(id), 1);
        }
    }

    fn run_with_resets(engine: &Arc<OutcomeEngine>) {
        let stop = Arc::new(AtomicBool::new(false));

        let pickers: Vec<_> = (0..4)
            .map(|t| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for i in 0..400 {
                        engine.pick_status(&request(&format!("ext-{}-{}", t, i), "A", ""));
                    }
                })
            })
            .collect();

        let resetter = {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..40 {
                    engine.reset();
                    thread::yield_now();
                }
            })
        };

        let observer = {
            let engine = engine.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut checks = 0;
                while !stop.load(Ordering::Acquire) {
                    assert!(engine.inner.lock().state.is_consistent());
                    checks += 1;
                    thread::yield_now();
                }
                checks
            })
        };

        for handle in pickers {
            handle.join().unwrap();
        }
        resetter.join().unwrap();
        stop.store(true, Ordering::Release);
        assert!(observer.join().unwrap() > 0);
    }

    #[test]
    fn test_reset_during_scenario_decisions_is_never_partial() {
        let rules: Vec<_> = (0..2_000)
            .map(|_| rule("", Outcome::FailUntilTimeout, 0))
            .collect();
        let engine = Arc::new(OutcomeEngine::new(
            Some(scenario(vec![account("A", rules)], vec![])),
            false,
        ));

        run_with_resets(&engine);

        assert!(engine.inner.lock().state.is_consistent());
        engine.reset();
        assert!(engine.inner.lock().state.is_empty());
        assert_eq!(engine.cursor(&ScopeKey::account("A")), 0);
        assert_eq!(engine.attempts("ext-0-0"), 0);
        assert!(engine.first_attempt_at("ext-0-0").is_none());
        assert_eq!(
            engine.pick_status(&request("ext-0-0", "A", "")),
            DisbursementStatus::Failed
        );
        assert_eq!(engine.cursor(&ScopeKey::account("A")), 1);
    }

    #[test]
    fn test_reset_during_default_decisions_is_never_partial() {
        let engine = Arc::new(OutcomeEngine::new(None, false));

        run_with_resets(&engine);

        engine.reset();
        assert!(engine.inner.lock().state.is_empty());
        assert_eq!(
            engine.pick_status(&request("ext-0-0", "A", "")),
            DisbursementStatus::Failed
        );
        assert_eq!(
            engine.pick_status(&request("ext-new", "A", "")),
            DisbursementStatus::Completed
        );
    }
}
