//! Offline training path
//!
//! Builds both model artifacts from a historical telemetry export, in the
//! same order the live path consumes them: window the history, extract the
//! feature matrix, drop IQR outliers, fit the scaler, then fit the forest
//! on the *scaled* matrix so training and inference see the same space.

use log::info;

use hydroguard_core::batch;
use hydroguard_core::config::{DEFAULT_IQR_MULTIPLIER, DEFAULT_WINDOW_DURATION_MS};
use hydroguard_core::preprocess::OutlierFilter;
use hydroguard_core::{FeatureVector, Normalizer, PipelineError, TelemetryRecord};

use crate::forest::ForestConfig;
use crate::scaler::StandardScaler;
use crate::scorer::ForestScorer;
use crate::{MlError, MlResult};

/// Tunables for the offline training run
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Window duration, matching the live aggregator's
    pub window_duration_ms: u64,
    /// IQR fence multiplier for pre-fit outlier removal
    pub iqr_multiplier: f32,
    /// Forest hyperparameters
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            window_duration_ms: DEFAULT_WINDOW_DURATION_MS,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            forest: ForestConfig::default(),
        }
    }
}

/// Fitted artifacts ready to plug into an inference engine
#[derive(Debug)]
pub struct TrainedArtifacts {
    /// Fitted normalizer
    pub scaler: StandardScaler,
    /// Trained scorer
    pub scorer: ForestScorer,
    /// Feature rows that survived outlier filtering
    pub training_rows: usize,
}

/// Train scaler and forest from raw historical records
pub fn train_from_history(
    records: &[TelemetryRecord],
    config: &TrainingConfig,
) -> MlResult<TrainedArtifacts> {
    let matrix =
        batch::feature_matrix(records, config.window_duration_ms).map_err(|err| match err {
            PipelineError::InvalidConfig(msg) => MlError::InvalidConfig(msg),
            _ => MlError::InsufficientData {
                required: 1,
                available: 0,
            },
        })?;

    let filtered = OutlierFilter::new(config.iqr_multiplier).filter(&matrix);
    if filtered.len() < 2 {
        return Err(MlError::InsufficientData {
            required: 2,
            available: filtered.len(),
        });
    }

    let mut scaler = StandardScaler::new();
    scaler.fit(&filtered)?;

    let scaled: Vec<FeatureVector> = filtered
        .iter()
        .map(|row| {
            scaler
                .transform(&row.to_array())
                .map(FeatureVector::from_array)
                // Scaler was fitted two lines up; transform cannot refuse
                .map_err(|_| MlError::InvalidConfig("scaler lost its fit"))
        })
        .collect::<MlResult<_>>()?;

    let mut scorer = ForestScorer::new(config.forest.clone());
    scorer.fit(&scaled)?;

    info!(
        "training complete: {} raw windows, {} after filtering",
        matrix.len(),
        filtered.len()
    );
    Ok(TrainedArtifacts {
        scaler,
        scorer,
        training_rows: filtered.len(),
    })
}
