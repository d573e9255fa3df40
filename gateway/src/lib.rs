//! Paymock Gateway
//!
//! HTTP mock of a payment gateway's disbursement API. Each disbursement is
//! answered synchronously and then reported to the system under test through
//! a webhook, with the outcome chosen by the scenario engine.

pub mod callback;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod service;

pub use callback::{CallbackSender, HttpCallbackClient, MemoryCallbackSender, ProbeResponse};
pub use config::GatewayConfig;
pub use error::{CallbackError, GatewayError};
pub use service::DisbursementService;
