//! Isolation Forest ensemble
//!
//! Single isolation trees are noisy; the forest averages path lengths over
//! many trees built on independent random subsamples, which is what gives
//! the score its stability. Subsampling also keeps individual trees small:
//! 256 samples per tree matches the standard recommendation regardless of
//! how much history is available.

use log::info;
use serde::{Deserialize, Serialize};

use crate::node::c_factor;
use crate::tree::{IsolationTree, TreeConfig};
use crate::{MlError, MlResult, Rng, Sample};

/// Default trees per forest
pub const DEFAULT_NUM_TREES: usize = 100;

/// Default subsample size per tree
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// Configuration for the Isolation Forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Subsample size for each tree
    pub sample_size: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Random seed; each tree derives its own from this
    pub seed: u32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            sample_size: DEFAULT_SAMPLE_SIZE,
            // ceil(log2(256)): deeper levels cannot isolate anything new
            max_depth: 8,
            seed: 42,
        }
    }
}

/// Isolation Forest for anomaly scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    config: ForestConfig,
    #[serde(skip, default)]
    rng: Rng,
    /// Effective per-tree training size, for the score denominator c(n)
    num_samples: usize,
}

impl IsolationForest {
    /// Create an untrained forest
    pub fn new(config: ForestConfig) -> Self {
        let seed = config.seed;
        Self {
            trees: Vec::new(),
            config,
            rng: Rng::new(seed),
            num_samples: 0,
        }
    }

    /// Train the forest on a feature matrix
    pub fn fit(&mut self, samples: &[Sample]) -> MlResult<()> {
        if samples.is_empty() {
            return Err(MlError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if self.config.num_trees == 0 {
            return Err(MlError::InvalidConfig("num_trees must be >= 1"));
        }

        self.num_samples = self.config.sample_size.min(samples.len());
        self.trees.clear();
        self.trees.reserve(self.config.num_trees);

        for i in 0..self.config.num_trees {
            let tree_config = TreeConfig {
                max_depth: self.config.max_depth,
                seed: self.config.seed.wrapping_add(i as u32),
            };
            let mut tree = IsolationTree::new(tree_config);
            let subset = self.sample_subset(samples);
            tree.fit(&subset)?;
            self.trees.push(tree);
        }

        info!(
            "isolation forest trained: {} trees, {} samples each, from {} rows",
            self.trees.len(),
            self.num_samples,
            samples.len()
        );
        Ok(())
    }

    /// Random subsample without replacement via partial Fisher-Yates
    fn sample_subset(&mut self, samples: &[Sample]) -> Vec<Sample> {
        let sample_size = self.config.sample_size.min(samples.len());
        if sample_size >= samples.len() {
            return samples.to_vec();
        }

        let mut indices: Vec<usize> = (0..samples.len()).collect();
        for i in 0..sample_size {
            let j = i + self.rng.next_range(samples.len() - i);
            indices.swap(i, j);
        }

        indices[..sample_size].iter().map(|&i| samples[i]).collect()
    }

    /// Anomaly score in (0, 1): 0.5 ≈ normal, towards 1 = anomalous
    ///
    /// `score = 2^(-E(h(x)) / c(n))` over the average path length across
    /// trees. Fails with `InsufficientData` on an untrained forest.
    pub fn anomaly_score(&self, sample: &Sample) -> MlResult<f32> {
        if self.trees.is_empty() {
            return Err(MlError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let total: f32 = self.trees.iter().map(|t| t.path_length(sample)).sum();
        let avg_path_length = total / self.trees.len() as f32;

        let expected = c_factor(self.num_samples);
        if expected == 0.0 {
            // One-sample training set carries no structure
            return Ok(0.5);
        }
        Ok(2.0_f32.powf(-avg_path_length / expected))
    }

    /// Whether the forest has been trained
    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Structural statistics, for logging after train/load
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            num_samples: self.num_samples,
        }
    }
}

/// Forest structure summary
#[derive(Debug, Clone, Copy)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Per-tree training sample count
    pub num_samples: usize,
}
