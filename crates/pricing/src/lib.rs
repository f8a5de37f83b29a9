//! Batch price estimation for used-vehicle listings
//!
//! Loads a labelled training table and an unlabelled evaluation table,
//! fills the missing-value sentinels, maps every categorical attribute onto
//! a shared integer code space fitted over both tables, trains a
//! deterministic random forest and writes one integer price per evaluation
//! row.

pub mod config;
pub mod encoder;
pub mod errors;
pub mod evaluation;
pub mod features;
pub mod metrics;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod predictor;
pub mod schema;
pub mod table;
pub mod trainer;

pub use config::{PathsConfig, PipelineConfig};
pub use encoder::{CategoryCodeTable, CategoryCodeTableBuilder, MISSING_CATEGORY};
pub use errors::{PipelineError, Result};
pub use evaluation::{
    holdout_split, score_model, EvaluationConfig, HoldoutReport, HoldoutSplit, ModelScore,
};
pub use features::{encode_table, EncodedTable};
pub use metrics::RegressionMetrics;
pub use normalizer::{default_sentinels, MissingValueNormalizer};
pub use output::{
    digest_hex, stage_file, write_all_atomic, write_atomic, PricePrediction, PredictionResult,
    StagedFile,
};
pub use pipeline::{EvaluationSummary, PreparedTables, PricingPipeline, RunSummary};
pub use predictor::{predict_prices, to_integer_price};
pub use schema::ListingSchema;
pub use table::{is_missing_token, ListingTable, TableKind, MISSING_TOKENS};
pub use trainer::fit_estimator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
