use thiserror::Error;

/// Errors returned by the tree-ensemble estimators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForestError {
    #[error("feature matrix is empty")]
    EmptyFeatures,

    #[error("target length {targets} does not match feature row count {rows}")]
    TargetLengthMismatch { rows: usize, targets: usize },

    #[error("row {row} has {got} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("non-finite value in row {row}, column `{column}`")]
    NonFiniteFeature { row: usize, column: String },

    #[error("non-finite target at row {row}")]
    NonFiniteTarget { row: usize },

    #[error("feature layout mismatch: model expects {expected:?}, got {got:?}")]
    LayoutMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("non-finite estimate for row {row}")]
    NonFiniteEstimate { row: usize },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, ForestError>;
