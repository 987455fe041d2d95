//! Pipeline Configuration
//!
//! Centralizes the tunables that control how sensitive the pipeline is to
//! anomalies and how quickly it reacts. Every value has a production default
//! and can be overridden at construction - there is no global configuration
//! state.
//!
//! Tuning intuition:
//! - Longer windows capture slower trends but delay reaction.
//! - Higher EMA alpha weights recent scores more - faster reaction, more
//!   false positives.
//! - `sustained_count` windows above threshold are required before the
//!   anomaly is confirmed; with 5-minute windows and a count of 3, a
//!   confirmed anomaly means 15 minutes of sustained abnormal behavior.

use crate::errors::{PipelineError, PipelineResult};

/// Default window duration: 5 minutes
pub const DEFAULT_WINDOW_DURATION_MS: u64 = 300_000;

/// Default EMA smoothing factor
pub const DEFAULT_EMA_ALPHA: f32 = 0.3;

/// Default smoothed-score threshold above which a window is anomalous
pub const DEFAULT_ANOMALY_THRESHOLD: f32 = 0.6;

/// Default number of consecutive anomalous windows before confirmation
pub const DEFAULT_SUSTAINED_COUNT: u32 = 3;

/// Default Tukey fence multiplier for the IQR outlier filter
pub const DEFAULT_IQR_MULTIPLIER: f32 = 1.5;

/// Configuration for the decision pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Duration each window must span, in milliseconds
    pub window_duration_ms: u64,
    /// EMA smoothing factor (0 < alpha <= 1)
    pub ema_alpha: f32,
    /// Smoothed-score threshold in [0, 1]
    pub anomaly_threshold: f32,
    /// Consecutive anomalous windows required for confirmation (>= 1)
    pub sustained_count: u32,
    /// IQR fence multiplier for offline outlier filtering (> 0)
    pub iqr_multiplier: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_duration_ms: DEFAULT_WINDOW_DURATION_MS,
            ema_alpha: DEFAULT_EMA_ALPHA,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            sustained_count: DEFAULT_SUSTAINED_COUNT,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl PipelineConfig {
    /// Check every tunable against its documented domain
    pub fn validate(&self) -> PipelineResult<()> {
        if self.window_duration_ms == 0 {
            return Err(PipelineError::InvalidConfig("window_duration_ms must be > 0"));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(PipelineError::InvalidConfig("ema_alpha must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.anomaly_threshold) {
            return Err(PipelineError::InvalidConfig("anomaly_threshold must be in [0, 1]"));
        }
        if self.sustained_count == 0 {
            return Err(PipelineError::InvalidConfig("sustained_count must be >= 1"));
        }
        if !(self.iqr_multiplier > 0.0) {
            return Err(PipelineError::InvalidConfig("iqr_multiplier must be > 0"));
        }
        Ok(())
    }
}
