//! Sustained-Anomaly Control Logic
//!
//! A single anomalous window is not actionable: demand spikes, sensor
//! glitches and maintenance activity all produce isolated high scores.
//! Actuation (throttling a pump, closing a valve) has a physical cost, so
//! the decision layer requires the smoothed score to stay above threshold
//! for a number of *consecutive* windows before confirming.
//!
//! State transitions per evaluated window:
//! - score above threshold: consecutive counter increments; the state is
//!   [`ControlState::Warning`] until the counter reaches the sustained
//!   count, then [`ControlState::AnomalyConfirmed`] for as long as scores
//!   stay above threshold.
//! - score at or below threshold: counter resets to zero and the state
//!   drops straight back to [`ControlState::Normal`], from any state. A
//!   confirmed anomaly whose score recovers needs the full consecutive run
//!   again before re-confirming.

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Pipeline decision state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlState {
    /// Smoothed score at or below threshold
    Normal,
    /// Above threshold, but not yet for the sustained count
    Warning,
    /// Above threshold for at least `sustained_count` consecutive windows
    AnomalyConfirmed,
}

impl ControlState {
    /// Wire-format name, matching the serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlState::Normal => "NORMAL",
            ControlState::Warning => "WARNING",
            ControlState::AnomalyConfirmed => "ANOMALY_CONFIRMED",
        }
    }
}

/// Threshold + consecutive-count state machine over smoothed scores
#[derive(Debug, Clone, Copy)]
pub struct ControlLogic {
    threshold: f32,
    sustained_count: u32,
    consecutive: u32,
    state: ControlState,
}

impl ControlLogic {
    /// Create the state machine (parameters validated upstream by the
    /// pipeline config)
    pub fn new(threshold: f32, sustained_count: u32) -> Self {
        Self {
            threshold,
            sustained_count,
            consecutive: 0,
            state: ControlState::Normal,
        }
    }

    /// Evaluate one smoothed score and return the resulting state
    pub fn evaluate(&mut self, smoothed_score: f32) -> ControlState {
        if smoothed_score > self.threshold {
            self.consecutive += 1;
            let next = if self.consecutive >= self.sustained_count {
                ControlState::AnomalyConfirmed
            } else {
                ControlState::Warning
            };
            if next != self.state {
                match next {
                    ControlState::AnomalyConfirmed => warn!(
                        "anomaly confirmed: score {:.4} above {:.2} for {} consecutive windows",
                        smoothed_score, self.threshold, self.consecutive
                    ),
                    _ => info!(
                        "anomaly warning: score {:.4} above {:.2} ({}/{})",
                        smoothed_score, self.threshold, self.consecutive, self.sustained_count
                    ),
                }
            }
            self.state = next;
        } else {
            if self.state != ControlState::Normal {
                info!(
                    "score {:.4} back under {:.2}, returning to normal",
                    smoothed_score, self.threshold
                );
            }
            self.consecutive = 0;
            self.state = ControlState::Normal;
        }
        self.state
    }

    /// Current state without evaluating anything
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Consecutive above-threshold windows so far
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Return to the initial normal state with a zeroed counter
    pub fn reset(&mut self) {
        self.consecutive = 0;
        self.state = ControlState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_stays_normal() {
        let mut logic = ControlLogic::new(0.6, 3);
        assert_eq!(logic.evaluate(0.2), ControlState::Normal);
        assert_eq!(logic.evaluate(0.59), ControlState::Normal);
        assert_eq!(logic.consecutive(), 0);
    }

    #[test]
    fn exactly_at_threshold_is_normal() {
        let mut logic = ControlLogic::new(0.6, 3);
        assert_eq!(logic.evaluate(0.6), ControlState::Normal);
    }

    #[test]
    fn confirms_after_sustained_count() {
        let mut logic = ControlLogic::new(0.6, 3);
        assert_eq!(logic.evaluate(0.7), ControlState::Warning);
        assert_eq!(logic.evaluate(0.65), ControlState::Warning);
        assert_eq!(logic.evaluate(0.8), ControlState::AnomalyConfirmed);
        assert_eq!(logic.consecutive(), 3);
    }

    #[test]
    fn stays_confirmed_while_above_threshold() {
        let mut logic = ControlLogic::new(0.6, 3);
        for _ in 0..3 {
            logic.evaluate(0.9);
        }
        assert_eq!(logic.evaluate(0.61), ControlState::AnomalyConfirmed);
        assert_eq!(logic.consecutive(), 4);
    }

    #[test]
    fn single_recovery_resets_everything() {
        let mut logic = ControlLogic::new(0.6, 3);
        for _ in 0..3 {
            logic.evaluate(0.9);
        }
        assert_eq!(logic.evaluate(0.3), ControlState::Normal);
        assert_eq!(logic.consecutive(), 0);

        // Re-confirmation requires the full run again
        assert_eq!(logic.evaluate(0.9), ControlState::Warning);
    }

    #[test]
    fn dip_in_a_run_restarts_the_count() {
        let mut logic = ControlLogic::new(0.6, 3);
        logic.evaluate(0.7);
        logic.evaluate(0.7);
        logic.evaluate(0.5);
        assert_eq!(logic.evaluate(0.7), ControlState::Warning);
        assert_eq!(logic.consecutive(), 1);
    }

    #[test]
    fn sustained_count_of_one_confirms_immediately() {
        let mut logic = ControlLogic::new(0.6, 1);
        assert_eq!(logic.evaluate(0.7), ControlState::AnomalyConfirmed);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut logic = ControlLogic::new(0.6, 3);
        logic.evaluate(0.9);
        logic.evaluate(0.9);
        logic.reset();

        assert_eq!(logic.state(), ControlState::Normal);
        assert_eq!(logic.consecutive(), 0);
        assert_eq!(logic.evaluate(0.9), ControlState::Warning);
    }

    #[test]
    fn state_serializes_to_wire_names() {
        let json = serde_json::to_string(&ControlState::AnomalyConfirmed).unwrap();
        assert_eq!(json, "\"ANOMALY_CONFIRMED\"");
        assert_eq!(ControlState::Warning.as_str(), "WARNING");
    }
}
