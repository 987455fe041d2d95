//! Time-Based Window Aggregation
//!
//! ## Overview
//!
//! Collects incoming telemetry records into time-bounded windows for batch
//! feature extraction. Unlike count-based windows, time-based windows ensure
//! consistent temporal coverage regardless of telemetry arrival rate, which
//! varies with radio packet loss and duty cycling.
//!
//! ## How it works
//!
//! 1. Each record is appended to an internal buffer; records arriving
//!    without a timestamp are stamped from the injected clock.
//! 2. Records older than the window duration *relative to the newest
//!    buffered record* are evicted - not relative to wall-clock "now", so
//!    bursty or delayed delivery still yields a window covering the intended
//!    physical duration once enough span accumulates.
//! 3. When the buffer spans at least the window duration from oldest to
//!    newest, [`WindowAggregator::is_ready`] returns true.
//! 4. [`WindowAggregator::take_window`] hands the buffer out as a [`Window`]
//!    and clears it, so consecutive live windows never overlap even though
//!    the buffer is logically a sliding structure.
//!
//! Out-of-order arrival is accepted: buffering is append-order, and span is
//! computed over min/max timestamps. Downstream consumers sort by time.

use log::{debug, info};

use std::sync::Arc;

use crate::telemetry::{TelemetryRecord, Window, MIN_WINDOW_RECORDS};
use crate::time::{SharedTimeSource, TimeSource, Timestamp};

/// Time-based window aggregator for real-time telemetry
///
/// One instance per monitored stream; `&mut self` on every mutating
/// operation gives the required mutual exclusion for free.
pub struct WindowAggregator {
    window_ms: u64,
    buffer: Vec<TelemetryRecord>,
    clock: SharedTimeSource,
}

impl WindowAggregator {
    /// Create an aggregator with an injected clock
    pub fn new(window_ms: u64, clock: SharedTimeSource) -> Self {
        Self {
            window_ms,
            buffer: Vec::new(),
            clock,
        }
    }

    /// Create an aggregator stamped by the system wall clock
    pub fn with_system_clock(window_ms: u64) -> Self {
        Self::new(window_ms, Arc::new(crate::time::SystemClock))
    }

    /// Append a record, stamping it if needed, then evict stale records
    pub fn add(&mut self, mut record: TelemetryRecord) {
        if record.timestamp.is_none() {
            record.timestamp = Some(self.clock.now());
        }
        self.buffer.push(record);
        self.evict_stale();

        debug!(
            "window buffer: {} records, span {} ms",
            self.buffer.len(),
            self.span_ms()
        );
    }

    /// Remove records outside the window relative to the newest buffered one
    fn evict_stale(&mut self) {
        let newest = match self.newest_timestamp() {
            Some(ts) => ts,
            None => return,
        };
        let cutoff = newest.saturating_sub(self.window_ms);
        self.buffer
            .retain(|r| r.timestamp.map_or(false, |ts| ts >= cutoff));
    }

    fn newest_timestamp(&self) -> Option<Timestamp> {
        self.buffer.iter().filter_map(|r| r.timestamp).max()
    }

    fn oldest_timestamp(&self) -> Option<Timestamp> {
        self.buffer.iter().filter_map(|r| r.timestamp).min()
    }

    /// Time span from oldest to newest buffered record, in milliseconds
    pub fn span_ms(&self) -> u64 {
        if self.buffer.len() < MIN_WINDOW_RECORDS {
            return 0;
        }
        match (self.oldest_timestamp(), self.newest_timestamp()) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0,
        }
    }

    /// Whether the buffer spans at least one full window
    ///
    /// A single record is never ready: its span is zero by definition.
    pub fn is_ready(&self) -> bool {
        self.buffer.len() >= MIN_WINDOW_RECORDS && self.span_ms() >= self.window_ms
    }

    /// Take the completed window and clear the buffer for the next cycle
    ///
    /// Returns `None` when the window is not ready; the buffer is untouched
    /// in that case. This is the single state-mutating boundary - no other
    /// operation clears the buffer apart from [`WindowAggregator::reset`].
    pub fn take_window(&mut self) -> Option<Window> {
        if !self.is_ready() {
            return None;
        }

        info!(
            "emitting window of {} records spanning {} ms",
            self.buffer.len(),
            self.span_ms()
        );
        Window::new(core::mem::take(&mut self.buffer)).ok()
    }

    /// Current number of buffered records
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer unconditionally (restart/reconfiguration)
    pub fn reset(&mut self) {
        self.buffer.clear();
        info!("window buffer reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;

    fn record_at(ts: Timestamp) -> TelemetryRecord {
        TelemetryRecord::new(10.0, 80.0, 200.0, ts)
    }

    fn aggregator(window_ms: u64) -> WindowAggregator {
        WindowAggregator::new(window_ms, Arc::new(FixedClock::new(0)))
    }

    #[test]
    fn single_record_never_ready() {
        let mut agg = aggregator(1000);
        agg.add(record_at(0));
        assert!(!agg.is_ready());
        assert_eq!(agg.span_ms(), 0);
        assert!(agg.take_window().is_none());
    }

    #[test]
    fn ready_when_span_reaches_duration() {
        let mut agg = aggregator(1000);
        agg.add(record_at(0));
        agg.add(record_at(999));
        assert!(!agg.is_ready());

        agg.add(record_at(1000));
        assert!(agg.is_ready());
    }

    #[test]
    fn take_window_clears_buffer() {
        let mut agg = aggregator(1000);
        for ts in [0, 500, 1000] {
            agg.add(record_at(ts));
        }

        let window = agg.take_window().unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(agg.len(), 0);
        assert!(!agg.is_ready());

        // Next window needs fresh data
        agg.add(record_at(2000));
        assert!(!agg.is_ready());
    }

    #[test]
    fn take_window_is_noop_when_not_ready() {
        let mut agg = aggregator(1000);
        agg.add(record_at(0));
        agg.add(record_at(500));

        assert!(agg.take_window().is_none());
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn evicts_relative_to_newest_not_wall_clock() {
        let mut agg = aggregator(1000);
        agg.add(record_at(0));
        agg.add(record_at(100));
        // A much newer record pushes the first two out of the window
        agg.add(record_at(5000));

        assert_eq!(agg.len(), 1);
        assert!(!agg.is_ready());
    }

    #[test]
    fn eviction_boundary_is_inclusive() {
        let mut agg = aggregator(1000);
        agg.add(record_at(0));
        agg.add(record_at(1000));
        // cutoff = 1000 - 1000 = 0; the record at 0 survives
        assert_eq!(agg.len(), 2);
        assert!(agg.is_ready());
    }

    #[test]
    fn out_of_order_arrival_accepted() {
        let mut agg = aggregator(1000);
        agg.add(record_at(1200));
        agg.add(record_at(200));
        assert_eq!(agg.span_ms(), 1000);
        assert!(agg.is_ready());
    }

    #[test]
    fn missing_timestamp_stamped_from_clock() {
        let mut agg = WindowAggregator::new(1000, Arc::new(FixedClock::new(7_000)));

        let mut record = record_at(0);
        record.timestamp = None;
        agg.add(record);

        assert_eq!(agg.len(), 1);
        agg.add(record_at(7_000 + 1000));
        assert!(agg.is_ready());
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut agg = aggregator(1000);
        for ts in [0, 500, 1000] {
            agg.add(record_at(ts));
        }
        agg.reset();

        assert_eq!(agg.len(), 0);
        assert_eq!(agg.span_ms(), 0);
        assert!(!agg.is_ready());
        assert!(agg.take_window().is_none());
    }
}
