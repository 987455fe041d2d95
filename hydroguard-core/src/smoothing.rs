//! Exponential Moving Average Smoothing
//!
//! Raw per-window anomaly scores are noisy: a single odd window (a toilet
//! flush coinciding with a kettle) can spike the score without meaning
//! anything. The EMA damps those spikes so the downstream state machine
//! reacts to trends, not blips.
//!
//! Recurrence: `ema = alpha * raw + (1 - alpha) * prev`. The very first
//! update seeds the state with the raw value unchanged - there is no
//! history to blend with, and biasing toward zero would suppress a genuine
//! anomaly in the first window after startup.

/// Stateful exponential-moving-average filter over anomaly scores
///
/// One instance per monitored stream. `alpha` close to 1 tracks raw scores
/// tightly; close to 0 smooths heavily.
#[derive(Debug, Clone, Copy)]
pub struct EmaSmoother {
    alpha: f32,
    current: Option<f32>,
}

impl EmaSmoother {
    /// Create a smoother with the given factor (0 < alpha <= 1, validated
    /// upstream by the pipeline config)
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            current: None,
        }
    }

    /// Fold one raw score into the average and return the smoothed value
    pub fn update(&mut self, raw: f32) -> f32 {
        let smoothed = match self.current {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.current = Some(smoothed);
        smoothed
    }

    /// Last smoothed value, if any update has happened
    pub fn current(&self) -> Option<f32> {
        self.current
    }

    /// Discard history; the next update seeds from its raw value
    pub fn reset(&mut self) {
        self.current = None;
    }
}
