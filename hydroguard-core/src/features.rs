//! Domain-Specific Feature Extraction
//!
//! ## Overview
//!
//! Transforms a window of raw telemetry (flow, tank level, water quality,
//! timestamp) into a fixed-length feature vector capturing the statistical
//! behavior of the water distribution system over that window.
//!
//! ## Feature vector (order is part of the contract)
//!
//! | # | Feature                | Meaning                                        |
//! |---|------------------------|------------------------------------------------|
//! | 0 | `flow_mean`            | Average flow in the window                     |
//! | 1 | `flow_std`             | Flow variability (population std)              |
//! | 2 | `flow_rate_change`     | Last minus first flow reading                  |
//! | 3 | `tank_level_gradient`  | Tank level slope, % per minute                 |
//! | 4 | `tank_level_drop_rate` | Largest single-step tank level decrease        |
//! | 5 | `quality_mean`         | Average water-quality index                    |
//! | 6 | `quality_variation`    | Coefficient of variation of quality            |
//! | 7 | `hour_of_day`          | Hour (0-23) at the window midpoint record      |
//! | 8 | `day_of_week`          | Day (0=Mon..6=Sun) at the window midpoint      |
//!
//! Downstream consumers (normalizer, scorer) index positionally, so the
//! ordering above must never change between training and inference.
//!
//! ## Degraded data
//!
//! A row missing a sensor field is zero-filled rather than rejected, and the
//! extraction result carries a `degraded` flag so operators can see sensor
//! outages. Rows with non-finite values are dropped entirely; if fewer than
//! two usable rows remain, extraction fails with `InsufficientData`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use log::warn;
use serde::Serialize;

use crate::errors::{PipelineError, PipelineResult};
use crate::telemetry::{Window, MIN_WINDOW_RECORDS};
use crate::time::{Timestamp, MS_PER_MINUTE};

/// Number of features in the vector
pub const FEATURE_COUNT: usize = 9;

/// Canonical feature names, in positional order
///
/// Must match the field order of [`FeatureVector::to_array`]; the scaler and
/// model receive features in the same order they were trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "flow_mean",
    "flow_std",
    "flow_rate_change",
    "tank_level_gradient",
    "tank_level_drop_rate",
    "quality_mean",
    "quality_variation",
    "hour_of_day",
    "day_of_week",
];

/// Fixed-length named feature vector
///
/// All entries are finite floats; the positional order of
/// [`FeatureVector::to_array`] matches [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    /// Average flow in the window
    pub flow_mean: f32,
    /// Population standard deviation of flow
    pub flow_std: f32,
    /// Last minus first flow reading
    pub flow_rate_change: f32,
    /// Tank level slope in % per minute (0 when the span is zero)
    pub tank_level_gradient: f32,
    /// Most negative successive tank-level difference
    pub tank_level_drop_rate: f32,
    /// Average water-quality index
    pub quality_mean: f32,
    /// Coefficient of variation of quality (0 when the mean is <= 0)
    pub quality_variation: f32,
    /// Hour of day (0-23) at the midpoint record
    pub hour_of_day: f32,
    /// Day of week (0=Monday .. 6=Sunday) at the midpoint record
    pub day_of_week: f32,
}

impl FeatureVector {
    /// Positional array in the canonical [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.flow_mean,
            self.flow_std,
            self.flow_rate_change,
            self.tank_level_gradient,
            self.tank_level_drop_rate,
            self.quality_mean,
            self.quality_variation,
            self.hour_of_day,
            self.day_of_week,
        ]
    }

    /// Build from a positional array in canonical order
    pub fn from_array(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            flow_mean: values[0],
            flow_std: values[1],
            flow_rate_change: values[2],
            tank_level_gradient: values[3],
            tank_level_drop_rate: values[4],
            quality_mean: values[5],
            quality_variation: values[6],
            hour_of_day: values[7],
            day_of_week: values[8],
        }
    }

    /// Whether every entry is a finite number
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Result of feature extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedFeatures {
    /// The 9-entry vector
    pub vector: FeatureVector,
    /// True when any missing sensor field was zero-filled
    pub degraded: bool,
}

/// A usable row: sorted key plus zero-filled sensor values
#[derive(Debug, Clone, Copy)]
struct CleanRow {
    ts: Timestamp,
    flow: f32,
    tank_level: f32,
    quality: f32,
}

/// Extract the feature vector from a window of raw records
///
/// Rows are sorted by timestamp before any first/last computation, so the
/// result is independent of arrival order. Fails with `InsufficientData`
/// when fewer than [`MIN_WINDOW_RECORDS`] usable rows remain after dropping
/// unparseable ones.
pub fn extract(window: &Window) -> PipelineResult<ExtractedFeatures> {
    let mut degraded = false;
    let mut rows: Vec<CleanRow> = Vec::with_capacity(window.len());

    for record in window.records() {
        let ts = match record.timestamp {
            Some(ts) => ts,
            // No timestamp means no place on the time axis; drop the row
            None => continue,
        };
        if !record.is_parseable() {
            continue;
        }
        if record.flow.is_none() || record.tank_level.is_none() || record.water_quality.is_none() {
            degraded = true;
        }
        rows.push(CleanRow {
            ts,
            flow: record.flow.unwrap_or(0.0),
            tank_level: record.tank_level.unwrap_or(0.0),
            quality: record.water_quality.unwrap_or(0.0),
        });
    }

    if rows.len() < MIN_WINDOW_RECORDS {
        return Err(PipelineError::InsufficientData {
            required: MIN_WINDOW_RECORDS,
            available: rows.len(),
        });
    }

    if degraded {
        warn!("window contains records with missing sensor fields - zero-filled");
    }

    // Total order including values so equal-timestamp rows sort the same
    // way for every input permutation
    rows.sort_by(|a, b| {
        a.ts.cmp(&b.ts)
            .then(a.flow.total_cmp(&b.flow))
            .then(a.tank_level.total_cmp(&b.tank_level))
            .then(a.quality.total_cmp(&b.quality))
    });

    let n = rows.len();
    let first = rows[0];
    let last = rows[n - 1];

    let flows: Vec<f32> = rows.iter().map(|r| r.flow).collect();
    let qualities: Vec<f32> = rows.iter().map(|r| r.quality).collect();

    let flow_mean = mean(&flows);
    let flow_std = population_std(&flows, flow_mean);
    let flow_rate_change = last.flow - first.flow;

    let span_minutes = ((last.ts - first.ts) as f64 / MS_PER_MINUTE) as f32;
    let tank_level_gradient = if span_minutes > 0.0 {
        (last.tank_level - first.tank_level) / span_minutes
    } else {
        0.0
    };

    let tank_level_drop_rate = rows
        .windows(2)
        .map(|pair| pair[1].tank_level - pair[0].tank_level)
        .fold(None, |acc: Option<f32>, diff| {
            Some(acc.map_or(diff, |m| m.min(diff)))
        })
        .unwrap_or(0.0);

    let quality_mean = mean(&qualities);
    let quality_std = population_std(&qualities, quality_mean);
    let quality_variation = if quality_mean > 0.0 {
        quality_std / quality_mean
    } else {
        0.0
    };

    // The "middle" record is index len/2, not an interpolated midpoint time
    let (hour_of_day, day_of_week) = calendar_features(rows[n / 2].ts);

    Ok(ExtractedFeatures {
        vector: FeatureVector {
            flow_mean,
            flow_std,
            flow_rate_change,
            tank_level_gradient,
            tank_level_drop_rate,
            quality_mean,
            quality_variation,
            hour_of_day,
            day_of_week,
        },
        degraded,
    })
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation (N divisor, not N-1)
fn population_std(values: &[f32], mean: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f32>()
        / values.len() as f32;
    variance.sqrt()
}

/// Hour-of-day and day-of-week (0=Monday) for a millisecond timestamp, UTC
fn calendar_features(ts: Timestamp) -> (f32, f32) {
    match DateTime::<Utc>::from_timestamp_millis(ts as i64) {
        Some(dt) => (
            dt.hour() as f32,
            dt.weekday().num_days_from_monday() as f32,
        ),
        None => (0.0, 0.0),
    }
}
