//! End-to-End Decision Pipeline
//!
//! ## Overview
//!
//! [`InferenceEngine`] wires the stages together and owns all mutable state
//! for one monitored stream:
//!
//! ```text
//! TelemetryRecord → WindowAggregator → extract() → Normalizer → Scorer
//!                                                                  ↓
//!            ActuationSink ← ControlLogic ← EmaSmoother ← raw score
//! ```
//!
//! Most calls to [`InferenceEngine::process`] return `Ok(None)` - the record
//! was buffered and the window is still filling. Once per completed window a
//! [`Decision`] comes back, and when that decision confirms an anomaly the
//! injected sink is handed the actuation command before the decision is
//! returned.
//!
//! ## Error Policy
//!
//! A window whose features cannot be extracted (too few clean rows after
//! dropping corrupt ones) is logged and *discarded* - the stream continues,
//! the smoother and state machine keep their state. Missing model artifacts
//! (`NotFitted`/`NotTrained`) propagate: they mean the deployment is broken,
//! not the data.

use log::{info, warn};

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::control::{ControlLogic, ControlState};
use crate::errors::PipelineResult;
use crate::features;
use crate::preprocess::Preprocessor;
use crate::smoothing::EmaSmoother;
use crate::telemetry::{Decision, TelemetryRecord};
use crate::time::{SharedTimeSource, SystemClock, TimeSource};
use crate::traits::{ActuationSink, AnomalyScorer, Normalizer};
use crate::window::WindowAggregator;

/// Round to 4 decimals for reporting; internal state keeps full precision
fn round_score(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

/// Orchestrator for the full telemetry-to-decision pipeline
///
/// Construct via [`InferenceEngine::builder`]. One instance per monitored
/// stream; `&mut self` on [`InferenceEngine::process`] serializes access.
pub struct InferenceEngine {
    aggregator: WindowAggregator,
    preprocessor: Preprocessor,
    scorer: Box<dyn AnomalyScorer>,
    smoother: EmaSmoother,
    control: ControlLogic,
    sink: Option<Box<dyn ActuationSink>>,
    clock: SharedTimeSource,
}

impl InferenceEngine {
    /// Start building an engine around fitted/trained collaborators
    pub fn builder(
        normalizer: Box<dyn Normalizer>,
        scorer: Box<dyn AnomalyScorer>,
    ) -> InferenceEngineBuilder {
        InferenceEngineBuilder {
            config: PipelineConfig::default(),
            normalizer,
            scorer,
            sink: None,
            clock: None,
        }
    }

    /// Ingest one record; returns a decision once per completed window
    ///
    /// `Ok(None)` means the record was buffered (or its window was dropped
    /// as unusable). Errors are reserved for unusable deployments: an
    /// unfitted normalizer or untrained scorer.
    pub fn process(&mut self, record: TelemetryRecord) -> PipelineResult<Option<Decision>> {
        // The aggregator stamps unstamped records from the engine's clock;
        // both hold the same shared time source.
        self.aggregator.add(record);

        let window = match self.aggregator.take_window() {
            Some(window) => window,
            None => return Ok(None),
        };
        let window_size = window.len();

        let extracted = match features::extract(&window) {
            Ok(extracted) => extracted,
            Err(err) => {
                warn!("dropping window of {} records: {}", window_size, err);
                return Ok(None);
            }
        };
        if extracted.degraded {
            warn!("window features degraded by zero-filled sensor fields");
        }

        let normalized = self.preprocessor.transform(&extracted.vector)?;
        let raw = self.scorer.score(&normalized)?.clamp(0.0, 1.0);
        let smoothed = self.smoother.update(raw);
        let state = self.control.evaluate(smoothed);

        let decision = Decision {
            state,
            raw_score: round_score(raw),
            smoothed_score: round_score(smoothed),
            window_size,
            features: extracted.vector,
        };
        info!(
            "decision: state={} raw={:.4} smoothed={:.4} window={}",
            state.as_str(),
            decision.raw_score,
            decision.smoothed_score,
            window_size
        );

        if state == ControlState::AnomalyConfirmed {
            if let Some(command) = decision.actuation(self.clock.now()) {
                if let Some(sink) = self.sink.as_mut() {
                    sink.publish(&command);
                }
            }
        }

        Ok(Some(decision))
    }

    /// Current control state without processing anything
    pub fn state(&self) -> ControlState {
        self.control.state()
    }

    /// Records currently buffered toward the next window
    pub fn buffered(&self) -> usize {
        self.aggregator.len()
    }

    /// Whether both model artifacts are loaded
    pub fn is_operational(&self) -> bool {
        self.preprocessor.is_fitted() && self.scorer.is_trained()
    }

    /// Clear buffer, smoother history and control state
    ///
    /// After a reset the engine behaves exactly like a freshly built one;
    /// model artifacts are untouched.
    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.smoother.reset();
        self.control.reset();
        info!("inference engine reset");
    }
}

/// Builder for [`InferenceEngine`]
pub struct InferenceEngineBuilder {
    config: PipelineConfig,
    normalizer: Box<dyn Normalizer>,
    scorer: Box<dyn AnomalyScorer>,
    sink: Option<Box<dyn ActuationSink>>,
    clock: Option<SharedTimeSource>,
}

impl InferenceEngineBuilder {
    /// Override the default configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an actuation sink (none attached by default)
    pub fn sink(mut self, sink: Box<dyn ActuationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Inject a clock (system wall clock by default)
    ///
    /// The aggregator stamps unstamped records from this same clock, so a
    /// test clock governs ingest stamping as well as actuation timestamps.
    pub fn clock(mut self, clock: SharedTimeSource) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and assemble the engine
    pub fn build(self) -> PipelineResult<InferenceEngine> {
        self.config.validate()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as SharedTimeSource);

        Ok(InferenceEngine {
            aggregator: WindowAggregator::new(self.config.window_duration_ms, clock.clone()),
            preprocessor: Preprocessor::new(self.normalizer, self.config.iqr_multiplier),
            scorer: self.scorer,
            smoother: EmaSmoother::new(self.config.ema_alpha),
            control: ControlLogic::new(
                self.config.anomaly_threshold,
                self.config.sustained_count,
            ),
            sink: self.sink,
            clock,
        })
    }
}
