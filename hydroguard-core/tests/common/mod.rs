//! Common test utilities for pipeline integration tests
//!
//! Provides:
//! - Deterministic telemetry generators with household-usage patterns
//! - Stub collaborators for the normalizer/scorer/sink boundaries

#![allow(dead_code)]

pub mod generators;
pub mod stubs;

pub use generators::TelemetryGenerator;
pub use stubs::{CaptureSink, IdentityNormalizer, ScriptedScorer, UnfittedNormalizer};

/// Route pipeline logs through the test harness (`RUST_LOG=debug` to see them)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
