//! Isolation Forest Anomaly Scoring for HydroGuard
//!
//! ## Overview
//!
//! This crate provides the model side of the HydroGuard pipeline: a
//! [`StandardScaler`] implementing `hydroguard_core`'s `Normalizer`
//! boundary, and a [`ForestScorer`] implementing its `AnomalyScorer`
//! boundary. Both fit offline on historical feature matrices and persist to
//! JSON, so a gateway can train once and reload artifacts across restarts.
//!
//! ## Why Isolation Forest?
//!
//! 1. **Unsupervised**: water-usage anomalies are rare and unlabeled
//! 2. **Low Memory**: only tree structures are stored, never training data
//! 3. **Fast Inference**: O(trees × depth) per window, no distance matrix
//! 4. **Interpretable**: the score is a path-length ratio with a fixed
//!    meaning (0.5 ≈ indistinguishable from training data)
//!
//! ## Algorithm
//!
//! Anomalies are easier to isolate by random axis-aligned splits than
//! normal points:
//!
//! ```text
//! Normal windows: need many partitions to isolate
//! Anomalous windows: isolated after a few partitions
//!
//! score = 2^(-E(h(x)) / c(n))
//! ```
//!
//! where `E(h(x))` is the average path length of the sample across trees
//! and `c(n)` is the expected path length for `n` training samples.

#![deny(unsafe_code)]

use thiserror_no_std::Error;

pub mod forest;
pub mod node;
pub mod scaler;
pub mod scorer;
pub mod training;
pub mod tree;

// Public API
pub use forest::{ForestConfig, ForestStats, IsolationForest};
pub use node::{c_factor, Node, NodeType};
pub use scaler::StandardScaler;
pub use scorer::ForestScorer;
pub use training::{train_from_history, TrainingConfig, TrainedArtifacts};
pub use tree::{IsolationTree, TreeConfig};

/// Maximum features a sample can carry
///
/// Fixed so [`Sample`] stays `Copy`; the pipeline's 9-entry vectors fit
/// with room for future features.
pub const MAX_FEATURES: usize = 16;

/// Result type for model operations
pub type MlResult<T> = Result<T, MlError>;

/// Errors from model fitting, scoring and persistence
#[derive(Error, Debug)]
pub enum MlError {
    /// Not enough samples to fit or score
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum samples required
        required: usize,
        /// Samples actually supplied
        available: usize,
    },

    /// Feature index out of range, or feature count mismatch
    #[error("Invalid feature access")]
    InvalidFeature,

    /// Invalid model configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Artifact (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One feature vector as the forest sees it
///
/// Fixed-size storage keeps samples `Copy` and allocation-free during tree
/// construction; `num_features` tracks the populated prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Feature storage; entries past `num_features` are zero
    pub features: [f32; MAX_FEATURES],
    /// Populated feature count
    pub num_features: usize,
}

impl Sample {
    /// Create a sample from a feature slice
    pub fn new(values: &[f32]) -> MlResult<Self> {
        if values.is_empty() || values.len() > MAX_FEATURES {
            return Err(MlError::InvalidFeature);
        }
        let mut features = [0.0; MAX_FEATURES];
        features[..values.len()].copy_from_slice(values);
        Ok(Self {
            features,
            num_features: values.len(),
        })
    }

    /// Feature value at an index, `None` past the populated prefix
    pub fn get_feature(&self, index: usize) -> Option<f32> {
        if index < self.num_features {
            Some(self.features[index])
        } else {
            None
        }
    }
}

/// Xorshift32 PRNG for split selection and subsampling
///
/// Deterministic per seed so trained forests are reproducible; statistical
/// quality is more than enough for random split points.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Create a generator from a seed (zero is remapped - xorshift has no
    /// zero state)
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform integer in `[0, n)`; `n` must be non-zero
    pub fn next_range(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n.max(1)
    }

    /// Uniform float in `[0, 1)`
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform float in `[min, max)`
    pub fn next_f32_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Natural logarithm via libm (no_std-friendly, deterministic across
/// targets)
pub(crate) fn ln_approx(x: f32) -> f32 {
    libm::logf(x)
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
