//! Paymock Scenario Engine
//!
//! Decides whether a mocked disbursement completes or fails. Decisions are
//! deterministic across repeated calls so that callers can exercise retry,
//! polling and webhook handling against predictable sequences.
//!
//! # Policies
//!
//! - Random: uniform coin flip per request, no state.
//! - Default: the first new external id of the process fails once, everything
//!   else completes.
//! - Scenario: per-account and per-batch rule lists loaded from JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use paymock_scenario::{load_optional, OutcomeEngine};
//!
//! let engine = OutcomeEngine::new(load_optional(Some("scenario.json")), false);
//! let status = engine.pick_status(&request);
//! ```

pub mod definition;
pub mod engine;
pub mod error;
pub mod policy;
pub mod state;

pub use definition::{
    load, load_optional, AccountScenario, BatchScenario, Outcome, Rule, ScenarioDefinition,
    DEFAULT_RETRY_TIMEOUT_MINUTES,
};
pub use engine::OutcomeEngine;
pub use error::{ScenarioError, ScenarioResult};
pub use policy::{OutcomePolicy, PolicyKind};
pub use state::ScopeKey;
