//! Pipeline-facing scorer
//!
//! Adapts the [`IsolationForest`] to `hydroguard_core`'s `AnomalyScorer`
//! boundary: feature arrays in, clamped [0, 1] scores out, and a hard
//! `NotTrained` failure when no model has been fitted or loaded. Artifacts
//! persist as JSON next to the scaler's.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use hydroguard_core::{AnomalyScorer, FeatureVector, PipelineError, PipelineResult, FEATURE_COUNT};

use crate::forest::{ForestConfig, IsolationForest};
use crate::{MlResult, Sample};

/// Isolation Forest behind the `AnomalyScorer` boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestScorer {
    forest: IsolationForest,
}

impl ForestScorer {
    /// Create an untrained scorer with the given forest configuration
    pub fn new(config: ForestConfig) -> Self {
        Self {
            forest: IsolationForest::new(config),
        }
    }

    /// Train on a (filtered, unnormalized or normalized - caller's choice,
    /// but it must match what is scored later) feature matrix
    pub fn fit(&mut self, rows: &[FeatureVector]) -> MlResult<()> {
        let samples: Vec<Sample> = rows
            .iter()
            .map(|row| Sample::new(&row.to_array()))
            .collect::<MlResult<_>>()?;
        self.forest.fit(&samples)?;

        let stats = self.forest.stats();
        info!(
            "forest scorer ready: {} trees, {} nodes, depth {}",
            stats.num_trees, stats.total_nodes, stats.max_depth
        );
        Ok(())
    }

    /// Persist the trained forest as JSON
    pub fn save(&self, path: &Path) -> MlResult<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously trained forest
    pub fn load(path: &Path) -> MlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let scorer: Self = serde_json::from_str(&json)?;
        Ok(scorer)
    }

    /// Structural statistics of the underlying forest
    pub fn stats(&self) -> crate::ForestStats {
        self.forest.stats()
    }
}

impl Default for ForestScorer {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl AnomalyScorer for ForestScorer {
    fn score(&self, features: &[f32; FEATURE_COUNT]) -> PipelineResult<f32> {
        if !self.forest.is_trained() {
            return Err(PipelineError::NotTrained);
        }
        let sample = Sample::new(features).map_err(|_| PipelineError::MalformedRecord)?;
        let score = self
            .forest
            .anomaly_score(&sample)
            .map_err(|_| PipelineError::NotTrained)?;
        Ok(score.clamp(0.0, 1.0))
    }

    fn is_trained(&self) -> bool {
        self.forest.is_trained()
    }
}
