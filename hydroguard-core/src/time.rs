//! Time management for the telemetry pipeline
//!
//! Provides a clock abstraction so the aggregator can stamp records that
//! arrive without a timestamp:
//! - System clock for production
//! - Fixed clock for deterministic tests
//!
//! All span/eviction math inside the pipeline is keyed to record timestamps,
//! not to these clocks - the clock is only consulted when a record carries no
//! timestamp of its own.

use std::sync::Arc;

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Milliseconds per minute, used for slope features
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Source of time for the pipeline
pub trait TimeSource: Send {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs fixed/test)
    fn is_wall_clock(&self) -> bool;
}

/// Shared handle to a time source
///
/// The engine and its aggregator consult the same clock, so every record
/// stamped anywhere in one pipeline carries a consistent notion of "now".
pub type SharedTimeSource = Arc<dyn TimeSource + Send + Sync>;

/// Wall-clock time source
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
///
/// Interior mutability keeps the `TimeSource` trait object shareable while
/// tests advance the clock between records.
#[derive(Debug, Default)]
pub struct FixedClock {
    timestamp: core::sync::atomic::AtomicU64,
}

impl FixedClock {
    /// Create a clock frozen at the given timestamp
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: core::sync::atomic::AtomicU64::new(timestamp),
        }
    }

    /// Jump the clock to an absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp
            .store(timestamp, core::sync::atomic::Ordering::Relaxed);
    }

    /// Move the clock forward by a relative amount
    pub fn advance(&self, ms: u64) {
        self.timestamp
            .fetch_add(ms, core::sync::atomic::Ordering::Relaxed);
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp.load(core::sync::atomic::Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
