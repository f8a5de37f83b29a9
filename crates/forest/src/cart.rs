//! CART (Classification and Regression Tree) builder
//!
//! Deterministic exact-greedy regression tree construction with a
//! squared-error criterion. Every feature column is sorted once per tree and
//! the sorted row lists are partitioned stably as the tree grows, so split
//! search at a node is a single linear scan per candidate feature.

use serde::{Deserialize, Serialize};

use crate::deterministic::{sample_without_replacement, SplitTieBreaker, TrainingRng};
use crate::matrix::FeatureMatrix;
use crate::tree::{Node, Tree};

/// Growth limits for a single tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeStats {
    /// Distinct rows in the node
    count: usize,
    /// Sum of bootstrap multiplicities
    weight: u64,
    sum: f64,
    min_target: f64,
    max_target: f64,
}

impl NodeStats {
    fn mean(&self) -> f64 {
        if self.weight == 0 {
            0.0
        } else {
            self.sum / self.weight as f64
        }
    }

    fn is_pure(&self) -> bool {
        self.min_target == self.max_target
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    position: usize,
    threshold: f64,
    proxy_gain: f64,
    tie_breaker: SplitTieBreaker,
}

struct PendingNode {
    node_idx: usize,
    depth: usize,
    /// One row list per feature, each sorted by that feature's value
    sorted: Vec<Vec<usize>>,
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    features: &'a FeatureMatrix,
    targets: &'a [f64],
    weights: Vec<u32>,
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    /// `weights[i]` is how many times row `i` was drawn; rows with weight 0
    /// do not take part in this tree.
    pub fn new(
        features: &'a FeatureMatrix,
        targets: &'a [f64],
        weights: Vec<u32>,
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.n_rows(), targets.len());
        debug_assert_eq!(features.n_rows(), weights.len());

        Self {
            features,
            targets,
            weights,
            config,
        }
    }

    /// Grow the tree. `rng` is only consumed when `max_features` restricts
    /// the candidate set.
    pub fn build(&self, rng: &mut TrainingRng) -> Tree {
        let n_features = self.features.n_features();
        let active: Vec<usize> = (0..self.features.n_rows())
            .filter(|&i| self.weights[i] > 0)
            .collect();

        if n_features == 0 || active.is_empty() {
            let stats = self.node_stats(&active);
            return Tree::new(vec![Node::leaf(0, stats.mean(), stats.weight as u32)]);
        }

        let sorted: Vec<Vec<usize>> = (0..n_features)
            .map(|f| {
                let mut rows = active.clone();
                rows.sort_by(|&a, &b| {
                    self.features
                        .value(a, f)
                        .total_cmp(&self.features.value(b, f))
                        .then(a.cmp(&b))
                });
                rows
            })
            .collect();

        let mut goes_left = vec![false; self.features.n_rows()];
        let mut nodes = vec![Node::leaf(0, 0.0, 0)];
        let mut stack = vec![PendingNode {
            node_idx: 0,
            depth: 0,
            sorted,
        }];

        while let Some(pending) = stack.pop() {
            let stats = self.node_stats(&pending.sorted[0]);
            let id = pending.node_idx as i32;
            let samples = stats.weight.min(u32::MAX as u64) as u32;

            let split = if self.is_terminal(&stats, pending.depth) {
                None
            } else {
                let candidates = self.candidate_features(n_features, rng);
                self.find_best_split(&pending.sorted, &candidates, &stats)
            };

            let Some(split) = split else {
                nodes[pending.node_idx] = Node::leaf(id, stats.mean(), samples);
                continue;
            };

            for (pos, &row) in pending.sorted[split.feature_idx].iter().enumerate() {
                goes_left[row] = pos <= split.position;
            }

            let (left_sorted, right_sorted): (Vec<_>, Vec<_>) = pending
                .sorted
                .into_iter()
                .map(|rows| rows.into_iter().partition::<Vec<_>, _>(|&r| goes_left[r]))
                .unzip();

            let left_idx = nodes.len();
            nodes.push(Node::leaf(left_idx as i32, 0.0, 0));
            let right_idx = nodes.len();
            nodes.push(Node::leaf(right_idx as i32, 0.0, 0));

            let mut node = Node::internal(id, split.feature_idx as i32, split.threshold, samples);
            node.left = left_idx as i32;
            node.right = right_idx as i32;
            nodes[pending.node_idx] = node;

            // Left subtree is grown first.
            stack.push(PendingNode {
                node_idx: right_idx,
                depth: pending.depth + 1,
                sorted: right_sorted,
            });
            stack.push(PendingNode {
                node_idx: left_idx,
                depth: pending.depth + 1,
                sorted: left_sorted,
            });
        }

        Tree::new(nodes)
    }

    fn is_terminal(&self, stats: &NodeStats, depth: usize) -> bool {
        self.config.max_depth.is_some_and(|max| depth >= max)
            || stats.count < self.config.min_samples_split
            || stats.count < 2 * self.config.min_samples_leaf
            || stats.is_pure()
    }

    fn candidate_features(&self, n_features: usize, rng: &mut TrainingRng) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k < n_features => sample_without_replacement(rng, n_features, k),
            _ => (0..n_features).collect(),
        }
    }

    /// Scan every candidate feature's sorted rows and keep the split that
    /// maximises `S_l^2 / W_l + S_r^2 / W_r`, which orders splits the same way
    /// as the weighted reduction in squared error.
    fn find_best_split(
        &self,
        sorted: &[Vec<usize>],
        candidates: &[usize],
        parent: &NodeStats,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.config.min_samples_leaf;
        let mut best: Option<SplitCandidate> = None;

        for &feature_idx in candidates {
            let rows = &sorted[feature_idx];
            let mut left_weight = 0u64;
            let mut left_sum = 0.0f64;

            for position in 0..rows.len().saturating_sub(1) {
                let row = rows[position];
                let w = self.weights[row];
                left_weight += w as u64;
                left_sum += w as f64 * self.targets[row];

                let left_count = position + 1;
                let right_count = rows.len() - left_count;
                if left_count < min_leaf || right_count < min_leaf {
                    continue;
                }

                let x = self.features.value(row, feature_idx);
                let x_next = self.features.value(rows[position + 1], feature_idx);
                if x_next <= x {
                    continue;
                }

                let right_weight = parent.weight - left_weight;
                let right_sum = parent.sum - left_sum;
                let proxy_gain = left_sum * left_sum / left_weight as f64
                    + right_sum * right_sum / right_weight as f64;

                let tie_breaker = SplitTieBreaker::new(feature_idx, position);
                let better = match &best {
                    None => true,
                    Some(current) => {
                        proxy_gain > current.proxy_gain
                            || (proxy_gain == current.proxy_gain
                                && tie_breaker < current.tie_breaker)
                    }
                };

                if better {
                    best = Some(SplitCandidate {
                        feature_idx,
                        position,
                        threshold: midpoint(x, x_next),
                        proxy_gain,
                        tie_breaker,
                    });
                }
            }
        }

        best
    }

    fn node_stats(&self, rows: &[usize]) -> NodeStats {
        let mut stats = NodeStats {
            count: rows.len(),
            weight: 0,
            sum: 0.0,
            min_target: f64::INFINITY,
            max_target: f64::NEG_INFINITY,
        };

        for &row in rows {
            let w = self.weights[row];
            let y = self.targets[row];
            stats.weight += w as u64;
            stats.sum += w as f64 * y;
            stats.min_target = stats.min_target.min(y);
            stats.max_target = stats.max_target.max(y);
        }

        stats
    }
}

/// Threshold between two adjacent distinct values. Falls back to the lower
/// value when the midpoint rounds up to the upper one.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower + (upper - lower) / 2.0;
    if mid >= upper {
        lower
    } else {
        mid
    }
}
