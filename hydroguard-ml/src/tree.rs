//! Isolation tree construction and traversal
//!
//! Trees partition the feature space with random axis-aligned splits until
//! samples are isolated or the depth limit is hit. Depth limits matter:
//! anomalies isolate early, so deep subtrees only ever model normal data
//! and the leaf `c(size)` correction covers the truncated remainder.

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeType};
use crate::{MlError, MlResult, Rng, Sample};

/// Configuration for a single isolation tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of the tree
    pub max_depth: usize,
    /// Random seed for this tree
    pub seed: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            seed: 42,
        }
    }
}

/// One isolation tree in flat-array form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    /// Tree nodes; children reference parents' slots by index
    pub nodes: Vec<Node>,
    /// Configuration the tree was built with
    pub config: TreeConfig,
    #[serde(skip, default)]
    rng: Rng,
    node_count: usize,
}

impl IsolationTree {
    /// Create an empty tree
    pub fn new(config: TreeConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
            rng: Rng::new(config.seed),
            node_count: 0,
        }
    }

    /// Build the tree over a sample subset
    pub fn fit(&mut self, samples: &[Sample]) -> MlResult<()> {
        if samples.is_empty() {
            return Err(MlError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        self.nodes.clear();
        self.node_count = 0;
        self.build_tree(samples, 0)?;
        Ok(())
    }

    fn build_tree(&mut self, samples: &[Sample], depth: u8) -> MlResult<u16> {
        let node_index = self.node_count as u16;

        // Terminate on isolation, depth limit, or a degenerate subset
        if depth as usize >= self.config.max_depth || samples.len() <= 1 || self.all_same(samples)
        {
            self.add_node(Node::external(samples.len() as u16, depth));
            return Ok(node_index);
        }

        let (feature, split_value) = self.select_split(samples)?;
        let (left_samples, right_samples) = partition(samples, feature, split_value);

        if left_samples.is_empty() || right_samples.is_empty() {
            self.add_node(Node::external(samples.len() as u16, depth));
            return Ok(node_index);
        }

        // Reserve this slot; children fill in before the internal node does
        self.node_count += 1;
        self.nodes.push(Node::external(0, depth));

        let left_index = self.build_tree(&left_samples, depth + 1)?;
        let right_index = self.build_tree(&right_samples, depth + 1)?;

        self.nodes[node_index as usize] =
            Node::internal(feature, split_value, left_index, right_index, depth);
        Ok(node_index)
    }

    fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.node_count += 1;
    }

    fn all_same(&self, samples: &[Sample]) -> bool {
        let first = &samples[0];
        samples[1..]
            .iter()
            .all(|s| s.features[..s.num_features] == first.features[..first.num_features])
    }

    /// Pick a random feature with spread, and a random split inside its range
    fn select_split(&mut self, samples: &[Sample]) -> MlResult<(u8, f32)> {
        let num_features = samples[0].num_features;
        if num_features == 0 {
            return Err(MlError::InvalidFeature);
        }

        for _ in 0..10 {
            let feature = self.rng.next_range(num_features) as u8;
            let (min_val, max_val) = feature_range(samples, feature)?;
            if (max_val - min_val).abs() < f32::EPSILON {
                continue;
            }
            let split_value = self.rng.next_f32_range(min_val, max_val);
            return Ok((feature, split_value));
        }

        // Every tried feature was constant; split on the first feature's median
        Ok((0, median_value(samples, 0)?))
    }

    /// Path length a sample takes from root to its terminating node
    pub fn path_length(&self, sample: &Sample) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }

        let mut current = 0usize;
        loop {
            let node = &self.nodes[current];
            match node.node_type {
                NodeType::External { .. } => return node.termination_path_length(),
                NodeType::Internal { .. } => match node.traverse(sample) {
                    Ok(next) if (next as usize) < self.nodes.len() => current = next as usize,
                    // Missing feature or corrupt index: stop at this depth
                    _ => return node.depth as f32,
                },
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum node depth
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth as usize).max().unwrap_or(0)
    }
}

fn feature_range(samples: &[Sample], feature: u8) -> MlResult<(f32, f32)> {
    let mut min_val = f32::INFINITY;
    let mut max_val = f32::NEG_INFINITY;
    for sample in samples {
        let val = sample
            .get_feature(feature as usize)
            .ok_or(MlError::InvalidFeature)?;
        min_val = min_val.min(val);
        max_val = max_val.max(val);
    }
    Ok((min_val, max_val))
}

fn median_value(samples: &[Sample], feature: u8) -> MlResult<f32> {
    let mut values: Vec<f32> = Vec::with_capacity(samples.len());
    for sample in samples {
        values.push(
            sample
                .get_feature(feature as usize)
                .ok_or(MlError::InvalidFeature)?,
        );
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values[values.len() / 2])
}

fn partition(samples: &[Sample], feature: u8, split_value: f32) -> (Vec<Sample>, Vec<Sample>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &sample in samples {
        if let Some(val) = sample.get_feature(feature as usize) {
            if val < split_value {
                left.push(sample);
            } else {
                right.push(sample);
            }
        }
    }
    (left, right)
}
