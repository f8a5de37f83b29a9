//! Bootstrap random forest and single decision tree regressors.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::{bootstrap_weights, seeded_rng, tree_seed};
use crate::errors::{ForestError, Result};
use crate::estimator::{validate_training_data, Predictor, Regressor};
use crate::matrix::FeatureMatrix;
use crate::tree::Tree;

pub const DEFAULT_TREE_COUNT: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Random forest training configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    /// Draw a bootstrap sample per tree; otherwise every tree sees all rows
    pub bootstrap: bool,
    pub tree: TreeConfig,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREE_COUNT,
            seed: DEFAULT_SEED,
            bootstrap: true,
            tree: TreeConfig::default(),
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ForestError::InvalidParameters(
                "n_trees must be at least 1".to_string(),
            ));
        }
        validate_tree_config(&self.tree)
    }
}

fn validate_tree_config(config: &TreeConfig) -> Result<()> {
    if config.min_samples_leaf == 0 {
        return Err(ForestError::InvalidParameters(
            "min_samples_leaf must be at least 1".to_string(),
        ));
    }
    if config.min_samples_split < 2 {
        return Err(ForestError::InvalidParameters(
            "min_samples_split must be at least 2".to_string(),
        ));
    }
    if config.max_features == Some(0) {
        return Err(ForestError::InvalidParameters(
            "max_features must be at least 1".to_string(),
        ));
    }
    if config.max_depth == Some(0) {
        return Err(ForestError::InvalidParameters(
            "max_depth must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Averaging ensemble of bootstrap-trained regression trees.
#[derive(Clone, Debug)]
pub struct RandomForest {
    config: ForestConfig,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl Regressor for RandomForest {
    type Model = ForestModel;

    fn name(&self) -> &str {
        "RandomForest"
    }

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<ForestModel> {
        validate_training_data(features, targets)?;
        self.config.validate()?;

        let n_rows = features.n_rows();
        let n_trees = self.config.n_trees;
        let mut trees = Vec::with_capacity(n_trees);

        info!(
            rows = n_rows,
            features = features.n_features(),
            trees = n_trees,
            seed = self.config.seed,
            "fitting random forest"
        );

        for tree_idx in 0..n_trees {
            let mut rng = seeded_rng(tree_seed(self.config.seed, tree_idx));

            let weights = if self.config.bootstrap {
                bootstrap_weights(&mut rng, n_rows)
            } else {
                vec![1; n_rows]
            };

            let tree =
                CartBuilder::new(features, targets, weights, self.config.tree.clone()).build(&mut rng);

            debug!(
                tree = tree_idx + 1,
                of = n_trees,
                nodes = tree.nodes.len(),
                depth = tree.depth(),
                "grew tree"
            );
            trees.push(tree);
        }

        Ok(ForestModel {
            feature_names: features.columns().to_vec(),
            trees,
        })
    }
}

/// Fitted forest: the trees plus the column layout they were grown on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

impl ForestModel {
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for ForestModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Mean of tree outputs, summed in tree order.
    fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }
}

/// A single CART tree on all rows. Used as a reference model in holdout
/// reports.
#[derive(Clone, Debug, Default)]
pub struct DecisionTree {
    config: TreeConfig,
    seed: u64,
}

impl DecisionTree {
    pub fn new(config: TreeConfig, seed: u64) -> Self {
        Self { config, seed }
    }
}

impl Regressor for DecisionTree {
    type Model = TreeModel;

    fn name(&self) -> &str {
        "DecisionTree"
    }

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<TreeModel> {
        validate_training_data(features, targets)?;
        validate_tree_config(&self.config)?;

        let weights = vec![1; features.n_rows()];
        let tree = CartBuilder::new(features, targets, weights, self.config.clone())
            .build(&mut seeded_rng(self.seed));

        debug!(nodes = tree.nodes.len(), depth = tree.depth(), "grew decision tree");

        Ok(TreeModel {
            feature_names: features.columns().to_vec(),
            tree,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TreeModel {
    feature_names: Vec<String>,
    tree: Tree,
}

impl TreeModel {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

impl Predictor for TreeModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.tree.evaluate(row)
    }
}
