//! Offline Batch Windowing
//!
//! Training runs over historical telemetry exports rather than a live
//! stream. This module slices a historical record set into *non-overlapping*
//! windows of the same duration the live aggregator uses, so the feature
//! distributions the model is fitted on match what it will score in
//! production.
//!
//! Unusable windows (fewer than two clean records after dropping corrupt
//! rows) are skipped rather than failing the whole batch; field exports
//! always contain gaps.

use log::{debug, info};

use crate::errors::{PipelineError, PipelineResult};
use crate::features::{self, FeatureVector};
use crate::telemetry::{TelemetryRecord, Window, MIN_WINDOW_RECORDS};

/// Slice historical records into consecutive non-overlapping windows
///
/// Records are bucketed by `(timestamp - earliest) / window_ms` after
/// sorting, so arrival order of the export does not matter. Unstamped
/// records are ignored - offline data with no timestamp cannot be placed.
/// A zero duration admits no windows at all.
pub fn windows_from_history(records: &[TelemetryRecord], window_ms: u64) -> Vec<Window> {
    if window_ms == 0 {
        return Vec::new();
    }
    let mut stamped: Vec<TelemetryRecord> = records
        .iter()
        .filter(|r| r.timestamp.is_some())
        .copied()
        .collect();
    if stamped.len() < MIN_WINDOW_RECORDS {
        return Vec::new();
    }
    stamped.sort_by_key(|r| r.timestamp);

    let earliest = match stamped[0].timestamp {
        Some(ts) => ts,
        None => return Vec::new(),
    };

    let mut windows = Vec::new();
    let mut bucket: Vec<TelemetryRecord> = Vec::new();
    let mut bucket_index = 0u64;

    for record in stamped {
        let ts = match record.timestamp {
            Some(ts) => ts,
            None => continue,
        };
        let index = (ts - earliest) / window_ms;
        if index != bucket_index {
            push_bucket(&mut windows, core::mem::take(&mut bucket));
            bucket_index = index;
        }
        bucket.push(record);
    }
    push_bucket(&mut windows, bucket);

    windows
}

fn push_bucket(windows: &mut Vec<Window>, bucket: Vec<TelemetryRecord>) {
    if let Ok(window) = Window::new(bucket) {
        windows.push(window);
    }
}

/// Extract the training feature matrix from historical records
///
/// One row per usable window. Windows whose extraction fails (all rows
/// corrupt) are skipped with a log line. A zero window duration is an
/// `InvalidConfig` error; `InsufficientData` is returned only when *no*
/// window yields features - a model cannot be fitted on an empty matrix.
pub fn feature_matrix(
    records: &[TelemetryRecord],
    window_ms: u64,
) -> PipelineResult<Vec<FeatureVector>> {
    if window_ms == 0 {
        return Err(PipelineError::InvalidConfig("window_ms must be > 0"));
    }
    let windows = windows_from_history(records, window_ms);
    let total = windows.len();

    let mut matrix = Vec::with_capacity(total);
    for window in &windows {
        match features::extract(window) {
            Ok(extracted) => matrix.push(extracted.vector),
            Err(err) => debug!("skipping window of {} records: {}", window.len(), err),
        }
    }

    if matrix.is_empty() {
        return Err(PipelineError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    info!(
        "feature matrix: {} rows from {} windows ({} records)",
        matrix.len(),
        total,
        records.len()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(ts: u64) -> TelemetryRecord {
        TelemetryRecord::new(10.0, 80.0, 200.0, ts)
    }

    #[test]
    fn buckets_are_non_overlapping() {
        // Two full windows of 1000 ms plus a straggler
        let records: Vec<TelemetryRecord> =
            [0, 400, 800, 1000, 1400, 1800, 2000].iter().map(|&ts| record_at(ts)).collect();

        let windows = windows_from_history(&records, 1000);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 3);
        assert_eq!(windows[1].len(), 3);

        let total: usize = windows.iter().map(|w| w.len()).sum();
        assert_eq!(total, 6, "straggler bucket of one record is dropped");
    }

    #[test]
    fn bucketing_ignores_arrival_order() {
        let shuffled: Vec<TelemetryRecord> =
            [1400, 0, 2000, 800, 1000, 400, 1800].iter().map(|&ts| record_at(ts)).collect();
        let windows = windows_from_history(&shuffled, 1000);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 3);
    }

    #[test]
    fn sparse_buckets_are_skipped() {
        // Middle window holds a single record
        let records: Vec<TelemetryRecord> =
            [0, 500, 1200, 2000, 2500].iter().map(|&ts| record_at(ts)).collect();
        let windows = windows_from_history(&records, 1000);
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn unstamped_records_ignored() {
        let mut records = vec![record_at(0), record_at(500)];
        let mut unstamped = record_at(0);
        unstamped.timestamp = None;
        records.push(unstamped);

        let windows = windows_from_history(&records, 1000);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 2);
    }

    #[test]
    fn matrix_has_one_row_per_usable_window() {
        let records: Vec<TelemetryRecord> =
            (0..20).map(|i| record_at(i * 200)).collect();
        let matrix = feature_matrix(&records, 1000).unwrap();
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn zero_window_duration_yields_no_windows() {
        let records = vec![record_at(0), record_at(500)];
        assert!(windows_from_history(&records, 0).is_empty());
    }

    #[test]
    fn zero_window_duration_is_a_config_error() {
        let records = vec![record_at(0), record_at(500)];
        let err = feature_matrix(&records, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn empty_history_is_an_error() {
        let err = feature_matrix(&[], 1000).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn all_corrupt_history_is_an_error() {
        let mut bad = record_at(0);
        bad.flow = Some(f32::NAN);
        let mut bad2 = record_at(500);
        bad2.flow = Some(f32::NAN);

        let err = feature_matrix(&[bad, bad2], 1000).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }
}
