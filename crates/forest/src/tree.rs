//! Regression tree structures and traversal.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the prediction value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    /// Rows with `value <= threshold` go left
    pub threshold: f64,
    pub leaf: Option<f64>,
    /// Weighted number of training rows that reached this node
    pub samples: u32,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, samples: u32) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx,
            threshold,
            leaf: None,
            samples,
        }
    }

    pub fn leaf(id: i32, value: f64, samples: u32) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
            samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector.
    ///
    /// Callers guarantee the vector matches the training layout; a malformed
    /// tree or short vector evaluates to 0.0 rather than panicking.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if let Some(value) = node.leaf {
                return value;
            }

            let Some(&feature_value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let next = if feature_value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(idx) else {
                continue;
            };
            if node.is_leaf() {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((node.left as usize, depth + 1));
                stack.push((node.right as usize, depth + 1));
            }
        }
        max_depth
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("Leaf node {i} has non-finite value {v}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("Node {i} has invalid {side} child: {child}"));
                }
            }
        }

        Ok(())
    }
}
