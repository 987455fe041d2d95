//! Feature standardization
//!
//! The forest splits on raw feature ranges, so columns with large magnitudes
//! (water quality around 200 ppm) would dominate columns near zero (tank
//! gradients in %/min) unless every column is brought to zero mean and unit
//! variance first. The scaler fits on the same filtered matrix as the
//! forest and must be applied to every vector scored afterwards.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use hydroguard_core::{
    FeatureVector, Normalizer, PipelineError, PipelineResult, FEATURE_COUNT,
};

use crate::{MlError, MlResult};

/// Per-column standardizer: `(x - mean) / std`
///
/// Unfitted until [`StandardScaler::fit`] or [`StandardScaler::load`]; the
/// `Normalizer` implementation fails with `NotFitted` before that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: [f32; FEATURE_COUNT],
    std: [f32; FEATURE_COUNT],
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit column means and standard deviations on a feature matrix
    ///
    /// Constant columns get a standard deviation of 1.0 so they map to zero
    /// instead of dividing by zero.
    pub fn fit(&mut self, rows: &[FeatureVector]) -> MlResult<()> {
        if rows.len() < 2 {
            return Err(MlError::InsufficientData {
                required: 2,
                available: rows.len(),
            });
        }

        let n = rows.len() as f32;
        let mut mean = [0.0f32; FEATURE_COUNT];
        for row in rows {
            for (col, value) in row.to_array().iter().enumerate() {
                mean[col] += value / n;
            }
        }

        let mut std = [0.0f32; FEATURE_COUNT];
        for row in rows {
            for (col, value) in row.to_array().iter().enumerate() {
                std[col] += (value - mean[col]).powi(2) / n;
            }
        }
        for s in std.iter_mut() {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        self.params = Some(ScalerParams { mean, std });
        info!("scaler fitted on {} rows", rows.len());
        Ok(())
    }

    /// Persist fitted parameters as JSON
    pub fn save(&self, path: &Path) -> MlResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load previously fitted parameters
    pub fn load(path: &Path) -> MlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let scaler: Self = serde_json::from_str(&json)?;
        Ok(scaler)
    }
}

impl Normalizer for StandardScaler {
    fn transform(&self, features: &[f32; FEATURE_COUNT]) -> PipelineResult<[f32; FEATURE_COUNT]> {
        let params = self.params.as_ref().ok_or(PipelineError::NotFitted)?;

        let mut out = [0.0f32; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            out[col] = (features[col] - params.mean[col]) / params.std[col];
        }
        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}
