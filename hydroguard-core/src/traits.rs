//! Collaborator Boundaries
//!
//! The pipeline core stays agnostic of how features are normalized, how
//! anomaly scores are produced, and how actuation commands leave the
//! process. Each concern is a trait implemented by an injected collaborator:
//!
//! - [`Normalizer`] - a previously fitted transform mapping raw feature
//!   vectors to standardized ones (`hydroguard-ml`'s `StandardScaler`).
//! - [`AnomalyScorer`] - a trained model mapping a normalized vector to a
//!   score in [0, 1] (`hydroguard-ml`'s Isolation Forest).
//! - [`ActuationSink`] - the outbound side (MQTT publish, HTTP post, test
//!   capture). Injected explicitly instead of living in module-global state
//!   so each monitored stream owns its collaborators.
//!
//! There is deliberately no fallback implementation for scoring: a pipeline
//! without loaded artifacts must fail loudly, never guess.

use crate::errors::PipelineResult;
use crate::features::FEATURE_COUNT;
use crate::telemetry::ActuationCommand;

/// Feature normalizer boundary
///
/// The live path only ever calls [`Normalizer::transform`]; fitting happens
/// in the offline training path.
pub trait Normalizer: Send {
    /// Transform a raw feature vector into the standardized space
    ///
    /// Fails with `NotFitted` when no fit/load has happened yet. Output has
    /// the same length and positional meaning as the input.
    fn transform(&self, features: &[f32; FEATURE_COUNT]) -> PipelineResult<[f32; FEATURE_COUNT]>;

    /// Whether the normalizer has been fitted or loaded
    fn is_fitted(&self) -> bool;
}

/// Anomaly scorer boundary
pub trait AnomalyScorer: Send {
    /// Score a normalized feature vector
    ///
    /// Returns a value in [0, 1]: 0 = normal, 1 = anomalous, monotonic in
    /// abnormality. Fails with `NotTrained` before fit/load.
    fn score(&self, features: &[f32; FEATURE_COUNT]) -> PipelineResult<f32>;

    /// Whether the model has been trained or loaded
    fn is_trained(&self) -> bool;
}

/// Outbound actuation boundary
///
/// Called by the orchestrator whenever a decision carries the confirmed
/// state. Delivery failures are the sink's problem to report; the decision
/// itself is already made.
pub trait ActuationSink: Send {
    /// Deliver one actuation command
    fn publish(&mut self, command: &ActuationCommand);
}

/// Sink that only logs, for deployments without an actuator attached
#[derive(Debug, Default)]
pub struct LogSink;

impl ActuationSink for LogSink {
    fn publish(&mut self, command: &ActuationCommand) {
        log::warn!(
            "actuation: {:?} severity={:.4} at {}",
            command.action,
            command.severity,
            command.timestamp
        );
    }
}
