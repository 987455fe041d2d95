//! Stub collaborators for the pipeline's injected boundaries

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use hydroguard_core::{
    ActuationCommand, ActuationSink, AnomalyScorer, Normalizer, PipelineError, PipelineResult,
    FEATURE_COUNT,
};

/// Fitted normalizer that passes vectors through untouched
pub struct IdentityNormalizer;

impl Normalizer for IdentityNormalizer {
    fn transform(&self, features: &[f32; FEATURE_COUNT]) -> PipelineResult<[f32; FEATURE_COUNT]> {
        Ok(*features)
    }

    fn is_fitted(&self) -> bool {
        true
    }
}

/// Normalizer that was never fitted
pub struct UnfittedNormalizer;

impl Normalizer for UnfittedNormalizer {
    fn transform(&self, _features: &[f32; FEATURE_COUNT]) -> PipelineResult<[f32; FEATURE_COUNT]> {
        Err(PipelineError::NotFitted)
    }

    fn is_fitted(&self) -> bool {
        false
    }
}

/// Scorer that replays a fixed score sequence, repeating the last entry
pub struct ScriptedScorer {
    scores: Vec<f32>,
    next: Cell<usize>,
}

impl ScriptedScorer {
    pub fn new(scores: &[f32]) -> Self {
        Self {
            scores: scores.to_vec(),
            next: Cell::new(0),
        }
    }
}

impl AnomalyScorer for ScriptedScorer {
    fn score(&self, _features: &[f32; FEATURE_COUNT]) -> PipelineResult<f32> {
        let i = self.next.get();
        self.next.set(i + 1);
        Ok(self.scores[i.min(self.scores.len() - 1)])
    }

    fn is_trained(&self) -> bool {
        true
    }
}

/// Sink that records every published command for later assertions
#[derive(Default)]
pub struct CaptureSink {
    pub published: Arc<Mutex<Vec<ActuationCommand>>>,
}

impl CaptureSink {
    /// Shared handle that stays valid after the sink moves into the engine
    pub fn handle(&self) -> Arc<Mutex<Vec<ActuationCommand>>> {
        self.published.clone()
    }
}

impl ActuationSink for CaptureSink {
    fn publish(&mut self, command: &ActuationCommand) {
        self.published.lock().unwrap().push(*command);
    }
}
