//! Preprocessing: Outlier Filtering and Normalization
//!
//! Two independent responsibilities composed into one adapter:
//!
//! 1. **IQR outlier filtering** (offline/batch only, used before fitting the
//!    normalizer). Faulty sensor readings (a -999 flow, a 9999 quality
//!    spike) would skew the scaler and the model; the interquartile-range
//!    fence clips extremes while staying robust to the right-skew typical of
//!    water usage data. Rows failing on *any* column are dropped entirely.
//!
//! 2. **Normalization**, delegated to the injected [`Normalizer`]. The live
//!    per-record path only ever calls `transform`; fitting happens in the
//!    offline training path.

use log::info;

use crate::errors::PipelineResult;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::traits::Normalizer;

/// IQR-based conjunctive row filter
///
/// For each column: Q1/Q3 are the 25th/75th percentiles (linear
/// interpolation between order statistics), and the fences are
/// `[Q1 - k*IQR, Q3 + k*IQR]`. A row survives only if every column lies
/// inside its fences.
#[derive(Debug, Clone, Copy)]
pub struct OutlierFilter {
    multiplier: f32,
}

impl OutlierFilter {
    /// Create a filter with the given fence multiplier (1.5 = Tukey fence)
    pub fn new(multiplier: f32) -> Self {
        Self { multiplier }
    }

    /// Drop rows with any column outside its IQR fences
    pub fn filter(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        if rows.len() < 2 {
            return rows.to_vec();
        }

        let mut lower = [f32::NEG_INFINITY; FEATURE_COUNT];
        let mut upper = [f32::INFINITY; FEATURE_COUNT];

        for col in 0..FEATURE_COUNT {
            let mut values: Vec<f32> = rows.iter().map(|r| r.to_array()[col]).collect();
            values.sort_by(|a, b| a.total_cmp(b));

            let q1 = quantile_sorted(&values, 0.25);
            let q3 = quantile_sorted(&values, 0.75);
            let iqr = q3 - q1;
            lower[col] = q1 - self.multiplier * iqr;
            upper[col] = q3 + self.multiplier * iqr;
        }

        let kept: Vec<FeatureVector> = rows
            .iter()
            .filter(|row| {
                row.to_array()
                    .iter()
                    .enumerate()
                    .all(|(col, &v)| v >= lower[col] && v <= upper[col])
            })
            .copied()
            .collect();

        let dropped = rows.len() - kept.len();
        if dropped > 0 {
            info!(
                "IQR filter removed {} of {} rows ({:.1}%)",
                dropped,
                rows.len(),
                dropped as f32 / rows.len() as f32 * 100.0
            );
        }
        kept
    }
}

/// Linear-interpolated quantile of an ascending-sorted slice
fn quantile_sorted(sorted: &[f32], q: f32) -> f32 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }

    let pos = q * (sorted.len() - 1) as f32;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = pos - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}

/// Adapter composing outlier filtering with the injected normalizer
pub struct Preprocessor {
    normalizer: Box<dyn Normalizer>,
    filter: OutlierFilter,
}

impl Preprocessor {
    /// Wrap a normalizer with the given IQR fence multiplier
    pub fn new(normalizer: Box<dyn Normalizer>, iqr_multiplier: f32) -> Self {
        Self {
            normalizer,
            filter: OutlierFilter::new(iqr_multiplier),
        }
    }

    /// Normalize one feature vector (live path)
    ///
    /// Propagates `NotFitted` untouched - the pipeline is not usable until
    /// the normalizer artifact is loaded.
    pub fn transform(&self, features: &FeatureVector) -> PipelineResult<[f32; FEATURE_COUNT]> {
        self.normalizer.transform(&features.to_array())
    }

    /// Batch outlier filtering (offline path, before fitting)
    pub fn filter_outliers(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        self.filter.filter(rows)
    }

    /// Whether the wrapped normalizer is ready for the live path
    pub fn is_fitted(&self) -> bool {
        self.normalizer.is_fitted()
    }
}
