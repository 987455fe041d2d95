//! Telemetry and Decision Types for the Water Monitoring Pipeline
//!
//! ## Overview
//!
//! This module defines the data that flows through HydroGuard's decision
//! pipeline: raw telemetry records on the way in, windows of records in the
//! middle, and decisions/actuation commands on the way out.
//!
//! ## Data Flow
//!
//! ```text
//! TelemetryRecord → WindowAggregator → Window → FeatureVector → Decision
//!                                                                  ↓
//!                                                         ActuationCommand
//! ```
//!
//! ## Design Notes
//!
//! Records are immutable once ingested: the aggregator assigns a timestamp to
//! records that arrive without one, but never rewrites sensor fields. Sensor
//! fields are optional because LoRa-class links routinely deliver partial
//! packets; how a missing field is handled (zero-fill with degradation flag)
//! is the feature extractor's concern, not the record's.

use serde::{Deserialize, Serialize};

use crate::control::ControlState;
use crate::errors::{PipelineError, PipelineResult};
use crate::features::FeatureVector;
use crate::time::Timestamp;

/// Minimum records a window must hold to be meaningful
pub const MIN_WINDOW_RECORDS: usize = 2;

/// One telemetry sample from the field
///
/// In the water monitoring deployment each record is one radio packet
/// carrying flow (L/min), tank level (%), and a water-quality index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Water flow rate in L/min
    pub flow: Option<f32>,
    /// Tank water level in %
    pub tank_level: Option<f32>,
    /// Water quality index (e.g. TDS in ppm)
    pub water_quality: Option<f32>,
    /// Sample timestamp in ms since epoch; assigned at ingest when absent
    pub timestamp: Option<Timestamp>,
}

impl TelemetryRecord {
    /// Create a fully populated record
    pub fn new(flow: f32, tank_level: f32, water_quality: f32, timestamp: Timestamp) -> Self {
        Self {
            flow: Some(flow),
            tank_level: Some(tank_level),
            water_quality: Some(water_quality),
            timestamp: Some(timestamp),
        }
    }

    /// Create an empty record at a given time (fields filled by the caller)
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            flow: None,
            tank_level: None,
            water_quality: None,
            timestamp: Some(timestamp),
        }
    }

    /// True when every present sensor field is a finite number
    ///
    /// NaN/infinity is the Rust-side equivalent of an unparseable sensor
    /// string: the row is unusable and gets dropped, not zero-filled.
    pub fn is_parseable(&self) -> bool {
        [self.flow, self.tank_level, self.water_quality]
            .iter()
            .all(|field| field.map_or(true, |v| v.is_finite()))
    }
}

/// A time-bounded, ordered batch of records
///
/// Invariants: at least [`MIN_WINDOW_RECORDS`] records, and a non-negative
/// time span. Records are kept in the order the producer supplied them;
/// consumers that care about time order (the feature extractor) sort by
/// timestamp themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    records: Vec<TelemetryRecord>,
}

impl Window {
    /// Build a window, enforcing the minimum-size invariant
    pub fn new(records: Vec<TelemetryRecord>) -> PipelineResult<Self> {
        if records.len() < MIN_WINDOW_RECORDS {
            return Err(PipelineError::InsufficientData {
                required: MIN_WINDOW_RECORDS,
                available: records.len(),
            });
        }
        Ok(Self { records })
    }

    /// Number of records in the window
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Windows are never empty by construction
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the records in producer order
    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    /// Consume the window, yielding its records
    pub fn into_records(self) -> Vec<TelemetryRecord> {
        self.records
    }

    /// Time span from oldest to newest stamped record, in milliseconds
    pub fn span_ms(&self) -> u64 {
        let stamped: Vec<Timestamp> =
            self.records.iter().filter_map(|r| r.timestamp).collect();
        match (stamped.iter().min(), stamped.iter().max()) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0,
        }
    }
}

/// Control decision emitted once per completed window
///
/// Scores are rounded to 4 decimals for presentation; the state machine
/// consumed the unrounded values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Current control state
    pub state: ControlState,
    /// Raw scorer output in [0, 1]
    pub raw_score: f32,
    /// EMA-smoothed score in [0, 1]
    pub smoothed_score: f32,
    /// Number of records in the window that produced this decision
    pub window_size: usize,
    /// The extracted feature vector, for observability
    pub features: FeatureVector,
}

impl Decision {
    /// Build the actuation payload when this decision warrants one
    ///
    /// Returns `Some` only while the state is `AnomalyConfirmed`; delivery
    /// of the command is an external collaborator's job.
    pub fn actuation(&self, timestamp: Timestamp) -> Option<ActuationCommand> {
        if self.state == ControlState::AnomalyConfirmed {
            Some(ActuationCommand {
                action: ActuationAction::Throttle,
                severity: self.smoothed_score,
                state: self.state,
                timestamp,
            })
        } else {
            None
        }
    }
}

/// Actions the physical actuator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActuationAction {
    /// Throttle the valve down
    Throttle,
}

/// Payload published when an anomaly is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActuationCommand {
    /// What the actuator should do
    pub action: ActuationAction,
    /// Smoothed anomaly score at confirmation time
    pub severity: f32,
    /// State that triggered the command (always `AnomalyConfirmed`)
    pub state: ControlState,
    /// When the command was issued, in ms since epoch
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rejects_single_record() {
        let records = vec![TelemetryRecord::new(1.0, 80.0, 200.0, 1000)];
        assert_eq!(
            Window::new(records),
            Err(PipelineError::InsufficientData { required: 2, available: 1 })
        );
    }

    #[test]
    fn window_span_ignores_order() {
        let records = vec![
            TelemetryRecord::new(1.0, 80.0, 200.0, 5000),
            TelemetryRecord::new(1.0, 80.0, 200.0, 1000),
            TelemetryRecord::new(1.0, 80.0, 200.0, 3000),
        ];
        let window = Window::new(records).unwrap();
        assert_eq!(window.span_ms(), 4000);
    }

    #[test]
    fn nan_field_is_unparseable() {
        let mut record = TelemetryRecord::new(1.0, 80.0, 200.0, 1000);
        assert!(record.is_parseable());

        record.flow = Some(f32::NAN);
        assert!(!record.is_parseable());

        // Missing is fine - that is a degradation case, not a parse failure
        record.flow = None;
        assert!(record.is_parseable());
    }

    #[test]
    fn actuation_only_when_confirmed() {
        let features = FeatureVector::default();
        let mut decision = Decision {
            state: ControlState::Warning,
            raw_score: 0.7,
            smoothed_score: 0.65,
            window_size: 10,
            features,
        };
        assert!(decision.actuation(1000).is_none());

        decision.state = ControlState::AnomalyConfirmed;
        let cmd = decision.actuation(1000).unwrap();
        assert_eq!(cmd.action, ActuationAction::Throttle);
        assert_eq!(cmd.severity, 0.65);
    }

    #[test]
    fn actuation_serializes_action_name() {
        let cmd = ActuationCommand {
            action: ActuationAction::Throttle,
            severity: 0.8,
            state: ControlState::AnomalyConfirmed,
            timestamp: 42,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"THROTTLE\""));
        assert!(json.contains("\"ANOMALY_CONFIRMED\""));
    }
}
