//! Deterministic telemetry generators
//!
//! Produces household-style water telemetry without any external RNG so
//! every test run sees identical data: diurnal flow variation from a sine,
//! slow tank drain/refill cycles, and bounded quality noise.

use hydroguard_core::{TelemetryRecord, Timestamp};

/// Generator state: monotonic time plus a sample counter
pub struct TelemetryGenerator {
    next_ts: Timestamp,
    interval_ms: u64,
    sample: u64,
}

impl TelemetryGenerator {
    pub fn new(start_ts: Timestamp, interval_ms: u64) -> Self {
        Self {
            next_ts: start_ts,
            interval_ms,
            sample: 0,
        }
    }

    /// Next record of ordinary household usage
    pub fn normal(&mut self) -> TelemetryRecord {
        let t = self.sample as f32;
        let flow = 10.0 + (t * 0.013).sin() * 2.5 + (t * 0.31).sin() * 0.4;
        let tank = 78.0 + (t * 0.002).sin() * 4.0;
        let quality = 200.0 + (t * 0.021).cos() * 6.0;
        self.emit(flow, tank, quality)
    }

    /// Next record of a burst-pipe signature: pegged flow, draining tank
    pub fn leak(&mut self) -> TelemetryRecord {
        let t = self.sample as f32;
        let flow = 50.0 + (t * 0.17).sin() * 0.8;
        let tank = (80.0 - t * 0.12).max(0.0);
        let quality = 198.0;
        self.emit(flow, tank, quality)
    }

    /// A batch of normal records
    pub fn normal_batch(&mut self, count: usize) -> Vec<TelemetryRecord> {
        (0..count).map(|_| self.normal()).collect()
    }

    /// A batch of leak records
    pub fn leak_batch(&mut self, count: usize) -> Vec<TelemetryRecord> {
        (0..count).map(|_| self.leak()).collect()
    }

    fn emit(&mut self, flow: f32, tank: f32, quality: f32) -> TelemetryRecord {
        let record = TelemetryRecord::new(flow, tank, quality, self.next_ts);
        self.next_ts += self.interval_ms;
        self.sample += 1;
        record
    }
}
