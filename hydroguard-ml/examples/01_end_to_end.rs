//! End-to-End Anomaly Detection Example
//!
//! This example walks the full HydroGuard lifecycle on synthetic telemetry:
//! train both model artifacts offline, assemble the live inference engine,
//! then stream records through it until a simulated leak is confirmed.
//!
//! ## What You'll Learn
//!
//! - Training the scaler and Isolation Forest from historical records
//! - Wiring artifacts into an `InferenceEngine` with an actuation sink
//! - How warnings escalate to a confirmed anomaly over sustained windows
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=info cargo run --example 01_end_to_end
//! ```

use hydroguard_core::{
    ActuationCommand, ActuationSink, InferenceEngine, PipelineConfig, TelemetryRecord,
};
use hydroguard_ml::{train_from_history, ForestConfig, TrainingConfig};

/// Sink that prints commands instead of talking to a broker
struct PrintSink;

impl ActuationSink for PrintSink {
    fn publish(&mut self, command: &ActuationCommand) {
        println!(
            ">>> ACTUATION: {:?} severity={:.4} at t={}",
            command.action, command.severity, command.timestamp
        );
    }
}

fn main() {
    env_logger::init();

    println!("HydroGuard End-to-End Example");
    println!("=============================\n");

    // One week of 30-second telemetry with household-like variation
    println!("Generating training history...");
    let history = synthetic_history(7 * 24 * 120);

    println!("Training scaler + isolation forest...");
    let config = TrainingConfig {
        window_duration_ms: 300_000,
        iqr_multiplier: 1.5,
        forest: ForestConfig {
            num_trees: 50,
            sample_size: 128,
            max_depth: 8,
            seed: 2024,
        },
    };
    let artifacts = train_from_history(&history, &config).expect("training failed");
    println!("Trained on {} feature windows\n", artifacts.training_rows);

    let mut engine = InferenceEngine::builder(
        Box::new(artifacts.scaler),
        Box::new(artifacts.scorer),
    )
    .config(PipelineConfig {
        window_duration_ms: 300_000,
        ..Default::default()
    })
    .sink(Box::new(PrintSink))
    .build()
    .expect("engine construction failed");

    // Live stream: 30 minutes of normal usage, then a burst pipe
    println!("Streaming live telemetry:");
    println!("-------------------------\n");

    let start = last_timestamp(&history) + 30_000;
    for i in 0..240u64 {
        let ts = start + i * 30_000;
        let record = if i < 60 {
            normal_record(ts, i)
        } else {
            // Continuous max-flow with the tank draining fast
            TelemetryRecord::new(52.0, 80.0 - (i - 60) as f32 * 0.4, 198.0, ts)
        };

        if let Some(decision) = engine.process(record).expect("pipeline error") {
            println!(
                "window of {:>2}: state={:<17} raw={:.4} smoothed={:.4}",
                decision.window_size,
                decision.state.as_str(),
                decision.raw_score,
                decision.smoothed_score
            );
        }
    }

    println!("\nFinal state: {}", engine.state().as_str());
}

fn synthetic_history(samples: u64) -> Vec<TelemetryRecord> {
    (0..samples).map(|i| normal_record(i * 30_000, i)).collect()
}

fn normal_record(ts: u64, i: u64) -> TelemetryRecord {
    let t = i as f32;
    let flow = 10.0 + (t * 0.013).sin() * 2.5 + (t * 0.31).sin() * 0.4;
    let tank = 78.0 + (t * 0.002).sin() * 4.0;
    let quality = 200.0 + (t * 0.021).cos() * 6.0;
    TelemetryRecord::new(flow, tank, quality, ts)
}

fn last_timestamp(records: &[TelemetryRecord]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.timestamp)
        .max()
        .unwrap_or(0)
}
