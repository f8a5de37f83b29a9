//! Deterministic tree-ensemble regression
//!
//! Provides a CART regression tree builder, a bootstrap random forest and a
//! single-tree reference model behind the [`Regressor`]/[`Predictor`]
//! capability traits. Training is single-threaded and fully reproducible for
//! a given feature matrix, target vector and seed.

pub mod cart;
pub mod deterministic;
pub mod errors;
pub mod estimator;
pub mod forest;
pub mod matrix;
pub mod tree;

pub use cart::{CartBuilder, TreeConfig};
pub use deterministic::{
    bootstrap_weights, sample_without_replacement, seeded_rng, tree_seed, SplitTieBreaker,
    TrainingRng,
};
pub use errors::ForestError;
pub use estimator::{validate_training_data, Predictor, Regressor};
pub use forest::{
    DecisionTree, ForestConfig, ForestModel, RandomForest, TreeModel, DEFAULT_SEED,
    DEFAULT_TREE_COUNT,
};
pub use matrix::FeatureMatrix;
pub use tree::{Node, Tree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
