//! Core decision pipeline for HydroGuard
//!
//! Turns a stream of raw water-telemetry records into control decisions:
//! windows the stream by time, extracts statistical features, normalizes
//! and scores them through injected model collaborators, smooths the scores
//! and confirms anomalies only when they are sustained.
//!
//! Key constraints:
//! - One engine instance per monitored stream, no global state
//! - Deterministic given the same records and injected clock
//! - Missing model artifacts fail loudly instead of guessing
//!
//! ```no_run
//! use hydroguard_core::{InferenceEngine, PipelineConfig, TelemetryRecord};
//! # use hydroguard_core::{Normalizer, AnomalyScorer};
//! # fn collaborators() -> (Box<dyn Normalizer>, Box<dyn AnomalyScorer>) { unimplemented!() }
//!
//! let (normalizer, scorer) = collaborators();
//! let mut engine = InferenceEngine::builder(normalizer, scorer)
//!     .config(PipelineConfig::default())
//!     .build()
//!     .unwrap();
//!
//! // Most records just buffer; one decision comes back per window
//! if let Some(decision) = engine.process(TelemetryRecord::new(12.0, 78.0, 210.0, 0)).unwrap() {
//!     println!("state: {}", decision.state.as_str());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod control;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod preprocess;
pub mod smoothing;
pub mod telemetry;
pub mod time;
pub mod traits;
pub mod window;

// Public API
pub use config::PipelineConfig;
pub use control::{ControlLogic, ControlState};
pub use errors::{PipelineError, PipelineResult};
pub use features::{ExtractedFeatures, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use pipeline::{InferenceEngine, InferenceEngineBuilder};
pub use smoothing::EmaSmoother;
pub use telemetry::{ActuationAction, ActuationCommand, Decision, TelemetryRecord, Window};
pub use time::{FixedClock, SharedTimeSource, SystemClock, TimeSource, Timestamp};
pub use traits::{ActuationSink, AnomalyScorer, LogSink, Normalizer};
pub use window::WindowAggregator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
