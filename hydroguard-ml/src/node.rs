//! Isolation tree node representation
//!
//! Nodes live in a flat array per tree and reference children by index, so
//! a whole tree serializes as one contiguous vector and traversal never
//! chases heap pointers.

use serde::{Deserialize, Serialize};

use crate::{MlError, MlResult, Sample};

/// Node type in the isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeType {
    /// Internal node with split condition
    Internal {
        /// Feature index to split on
        feature: u8,
        /// Split value
        split_value: f32,
        /// Left child index (feature < split)
        left: u16,
        /// Right child index
        right: u16,
    },
    /// Leaf node (external)
    External {
        /// Number of training samples that reached this leaf
        size: u16,
    },
}

/// Compact node: type plus depth from root
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Depth from the root
    pub depth: u8,
}

impl Node {
    /// Create an internal node
    pub fn internal(feature: u8, split_value: f32, left: u16, right: u16, depth: u8) -> Self {
        Self {
            node_type: NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            },
            depth,
        }
    }

    /// Create an external (leaf) node
    pub fn external(size: u16, depth: u8) -> Self {
        Self {
            node_type: NodeType::External { size },
            depth,
        }
    }

    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::External { .. })
    }

    /// Path length contributed when traversal terminates at this node
    ///
    /// Leaves holding several samples add `c(size)` - the expected extra
    /// depth had the tree kept splitting.
    pub fn termination_path_length(&self) -> f32 {
        match self.node_type {
            NodeType::External { size } => self.depth as f32 + c_factor(size as usize),
            NodeType::Internal { .. } => self.depth as f32,
        }
    }

    /// Child index to visit next for a sample
    pub fn traverse(&self, sample: &Sample) -> MlResult<u16> {
        match self.node_type {
            NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            } => {
                let value = sample
                    .get_feature(feature as usize)
                    .ok_or(MlError::InvalidFeature)?;
                if value < split_value {
                    Ok(left)
                } else {
                    Ok(right)
                }
            }
            NodeType::External { .. } => {
                Err(MlError::InvalidConfig("cannot traverse from leaf node"))
            }
        }
    }
}

/// Expected path length c(n) of an unsuccessful BST search over n items
///
/// Exact values for small n, harmonic approximation beyond.
pub fn c_factor(n: usize) -> f32 {
    if n <= 1 {
        return 0.0;
    }

    match n {
        2 => 1.0,
        3 => 1.5,
        4 => 1.833,
        5 => 2.083,
        6 => 2.283,
        7 => 2.450,
        8 => 2.593,
        9 => 2.718,
        10 => 2.829,
        _ => {
            // 2 * H(n-1) - 2 * (n-1) / n
            let h = harmonic_approx(n - 1);
            2.0 * h - 2.0 * (n as f32 - 1.0) / (n as f32)
        }
    }
}

/// Harmonic number approximation: ln(n) + gamma + 1/(2n)
fn harmonic_approx(n: usize) -> f32 {
    const EULER: f32 = 0.5772156649;
    crate::ln_approx(n as f32) + EULER + 0.5 / (n as f32)
}
