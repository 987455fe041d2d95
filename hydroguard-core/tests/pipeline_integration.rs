//! Integration tests for the decision pipeline
//!
//! Drives the complete flow - telemetry ingestion, windowing, feature
//! extraction, normalization, scoring, smoothing, control - with realistic
//! generated telemetry and scripted scorer outputs, so the state machine
//! semantics are asserted independently of any trained model.

mod common;

use common::{CaptureSink, IdentityNormalizer, ScriptedScorer, TelemetryGenerator, UnfittedNormalizer};
use hydroguard_core::{
    ActuationAction, ControlState, Decision, FixedClock, InferenceEngine, PipelineConfig,
    PipelineError, TelemetryRecord,
};
use std::sync::Arc;

const INTERVAL_MS: u64 = 30_000;
const WINDOW_MS: u64 = 60_000;

fn engine(scores: &[f32], sustained_count: u32) -> InferenceEngine {
    InferenceEngine::builder(Box::new(IdentityNormalizer), Box::new(ScriptedScorer::new(scores)))
        .config(PipelineConfig {
            window_duration_ms: WINDOW_MS,
            ema_alpha: 1.0,
            anomaly_threshold: 0.6,
            sustained_count,
            ..Default::default()
        })
        .clock(Arc::new(FixedClock::new(0)))
        .build()
        .unwrap()
}

/// Feed generated records until the engine emits its next decision
fn next_decision(engine: &mut InferenceEngine, generator: &mut TelemetryGenerator) -> Decision {
    for _ in 0..100 {
        if let Some(decision) = engine.process(generator.normal()).unwrap() {
            return decision;
        }
    }
    panic!("no decision after 100 records");
}

#[test]
fn sustained_high_scores_escalate_to_confirmation() {
    common::init_logging();
    let mut engine = engine(&[0.7, 0.65, 0.8], 3);
    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);

    let first = next_decision(&mut engine, &mut generator);
    assert_eq!(first.state, ControlState::Warning);
    assert_eq!(first.raw_score, 0.7);

    let second = next_decision(&mut engine, &mut generator);
    assert_eq!(second.state, ControlState::Warning);

    let third = next_decision(&mut engine, &mut generator);
    assert_eq!(third.state, ControlState::AnomalyConfirmed);
    assert_eq!(third.smoothed_score, 0.8);
}

#[test]
fn recovery_resets_and_requires_full_run_again() {
    let mut engine = engine(&[0.7, 0.7, 0.8, 0.5, 0.7], 3);
    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);

    let states: Vec<ControlState> = (0..5)
        .map(|_| next_decision(&mut engine, &mut generator).state)
        .collect();

    assert_eq!(
        states,
        [
            ControlState::Warning,
            ControlState::Warning,
            ControlState::AnomalyConfirmed,
            ControlState::Normal,
            ControlState::Warning,
        ]
    );
}

#[test]
fn confirmation_publishes_one_throttle_command() {
    let sink = CaptureSink::default();
    let published = sink.handle();

    let mut engine = InferenceEngine::builder(
        Box::new(IdentityNormalizer),
        Box::new(ScriptedScorer::new(&[0.7, 0.7, 0.8, 0.5])),
    )
    .config(PipelineConfig {
        window_duration_ms: WINDOW_MS,
        ema_alpha: 1.0,
        sustained_count: 3,
        ..Default::default()
    })
    .clock(Arc::new(FixedClock::new(999)))
    .sink(Box::new(sink))
    .build()
    .unwrap();

    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);
    for _ in 0..4 {
        next_decision(&mut engine, &mut generator);
    }

    let commands = published.lock().unwrap();
    assert_eq!(commands.len(), 1, "only the confirmed window publishes");
    assert_eq!(commands[0].action, ActuationAction::Throttle);
    assert_eq!(commands[0].severity, 0.8);
    assert_eq!(commands[0].state, ControlState::AnomalyConfirmed);
    assert_eq!(commands[0].timestamp, 999);
}

#[test]
fn smoothing_damps_isolated_spikes() {
    // Default alpha 0.3: a single 1.0 spike after calm windows must not
    // push the smoothed score over the threshold
    let mut engine = InferenceEngine::builder(
        Box::new(IdentityNormalizer),
        Box::new(ScriptedScorer::new(&[0.1, 0.1, 0.1, 1.0, 0.1])),
    )
    .config(PipelineConfig {
        window_duration_ms: WINDOW_MS,
        ema_alpha: 0.3,
        ..Default::default()
    })
    .clock(Arc::new(FixedClock::new(0)))
    .build()
    .unwrap();

    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);
    let mut states = Vec::new();
    for _ in 0..5 {
        let decision = next_decision(&mut engine, &mut generator);
        states.push((decision.state, decision.smoothed_score));
    }

    for (state, smoothed) in &states {
        assert_eq!(*state, ControlState::Normal, "smoothed {smoothed} escalated");
        assert!(*smoothed <= 0.6);
    }
}

#[test]
fn missing_artifacts_surface_per_window() {
    let mut engine = InferenceEngine::builder(
        Box::new(UnfittedNormalizer),
        Box::new(ScriptedScorer::new(&[0.5])),
    )
    .config(PipelineConfig {
        window_duration_ms: WINDOW_MS,
        ..Default::default()
    })
    .clock(Arc::new(FixedClock::new(0)))
    .build()
    .unwrap();
    assert!(!engine.is_operational());

    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);
    let mut errors = 0;
    for _ in 0..9 {
        if engine.process(generator.normal()) == Err(PipelineError::NotFitted) {
            errors += 1;
        }
    }
    // One error per completed window (3 records each), stream keeps going
    assert_eq!(errors, 3);
}

#[test]
fn partially_missing_fields_still_decide() {
    let mut engine = engine(&[0.2], 3);

    // Tank level missing from every record: zero-filled with a degraded
    // flag internally, but the decision still comes out
    let mut decision = None;
    for i in 0..3u64 {
        let mut record = TelemetryRecord::at(i * INTERVAL_MS);
        record.flow = Some(10.0 + i as f32);
        record.water_quality = Some(200.0);
        decision = engine.process(record).unwrap();
    }

    let decision = decision.expect("window should complete");
    assert_eq!(decision.state, ControlState::Normal);
    assert_eq!(decision.features.tank_level_gradient, 0.0);
}

#[test]
fn decision_serializes_with_wire_state_names() {
    let mut engine = engine(&[0.7], 1);
    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);

    let decision = next_decision(&mut engine, &mut generator);
    let json = serde_json::to_string(&decision).unwrap();

    assert!(json.contains("\"ANOMALY_CONFIRMED\""));
    assert!(json.contains("\"raw_score\":0.7"));
    assert!(json.contains("\"flow_mean\""));
}

#[test]
fn reset_mid_escalation_discards_progress() {
    let mut engine = engine(&[0.9, 0.9, 0.9, 0.9], 3);
    let mut generator = TelemetryGenerator::new(0, INTERVAL_MS);

    next_decision(&mut engine, &mut generator);
    next_decision(&mut engine, &mut generator);
    engine.reset();
    assert_eq!(engine.state(), ControlState::Normal);

    // The run restarts from scratch
    let decision = next_decision(&mut engine, &mut generator);
    assert_eq!(decision.state, ControlState::Warning);
}
