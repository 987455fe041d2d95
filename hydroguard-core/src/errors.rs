//! Error Types for the Decision Pipeline
//!
//! ## Design Philosophy
//!
//! Pipeline errors fall into two families that callers must be able to tell
//! apart programmatically:
//!
//! 1. **Recoverable** — transient conditions that resolve themselves as more
//!    telemetry arrives. `InsufficientData` and `MalformedRecord` belong
//!    here: the current window is discarded and the next one is attempted
//!    independently.
//!
//! 2. **Fatal until operator action** — the pipeline is mis-deployed.
//!    `NotFitted` and `NotTrained` mean an artifact (scaler or model) was
//!    never loaded; no amount of waiting fixes this, and there is no safe
//!    default anomaly judgment to fall back on. These must surface loudly.
//!
//! Errors are kept small (`Copy`, inline `&'static str` only) so they can be
//! returned from hot per-record paths without allocation.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use hydroguard_core::errors::PipelineError;
//!
//! fn handle(err: PipelineError) {
//!     if err.is_recoverable() {
//!         // Log and wait for the next window
//!     } else {
//!         // Page the operator: model/scaler artifacts missing
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline errors - kept small for hot-path returns
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// Too few usable rows for window or feature computation
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of usable records needed
        required: usize,
        /// Actual number of usable records available
        available: usize,
    },

    /// Normalizer used before fit/load
    #[error("Normalizer has not been fitted - call fit() or load() first")]
    NotFitted,

    /// Scorer used before train/load
    #[error("Model has not been trained - call fit() or load() first")]
    NotTrained,

    /// Sensor fields unparseable (NaN, infinity)
    #[error("Malformed record: sensor field is not a finite number")]
    MalformedRecord,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl PipelineError {
    /// Whether the error clears on its own once more data arrives
    ///
    /// `NotFitted`/`NotTrained` are permanent configuration faults and must
    /// propagate to the operator; everything else is a per-window condition.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotFitted | Self::NotTrained)
    }
}
