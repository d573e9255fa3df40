//! Paymock Common Types
//!
//! Shared types for the disbursement gateway mock: the request and response
//! shapes exchanged over HTTP, the webhook payload, canonical statuses and
//! the deterministic identifiers derived from external ids.

pub mod disbursement;
pub mod identifiers;
pub mod nullable;
pub mod status;
pub mod time;

pub use disbursement::*;
pub use identifiers::*;
pub use nullable::*;
pub use status::*;
pub use time::*;
