//! Test infrastructure for gNMI configuration managers
//!
//! Provides:
//! - A recording mock transport with scripted get responses
//! - Failure, latency and cancellation injection
//! - Device response fixtures
//! - Set-operation verification helpers

pub mod fixtures;
mod mock;
mod verification;

pub use fixtures::*;
pub use mock::MockTransport;
pub use verification::*;
