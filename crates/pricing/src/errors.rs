//! Error taxonomy for the pricing pipeline

use autoprice_forest::ForestError;
use thiserror::Error;

use crate::table::TableKind;

/// Errors returned by the pricing pipeline. Every variant is fatal for the
/// run; none of them leave a result file behind.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("schema error: {table} table is missing required column `{column}`")]
    Schema { table: TableKind, column: String },

    #[error("invalid value in {table} table, row {row}, column `{column}`: {reason}")]
    InvalidValue {
        table: TableKind,
        /// 1-based data row, header excluded
        row: usize,
        column: String,
        reason: String,
    },

    #[error("encoding error: value `{value}` of column `{column}` in {table} table has no category code")]
    Encoding {
        table: TableKind,
        column: String,
        value: String,
    },

    #[error("training error: {0}")]
    Training(#[source] ForestError),

    #[error("inference error: {0}")]
    Inference(#[source] ForestError),

    #[error("result error: {0}")]
    Format(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Pipeline stage the error was raised in.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Schema { .. } => "schema",
            PipelineError::InvalidValue { .. } => "load",
            PipelineError::Encoding { .. } => "encode",
            PipelineError::Training(_) => "train",
            PipelineError::Inference(_) => "predict",
            PipelineError::Format(_) => "format",
            PipelineError::Config(_) => "config",
            PipelineError::Csv { .. } | PipelineError::Io { .. } => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_table_and_column() {
        let err = PipelineError::Schema {
            table: TableKind::Evaluation,
            column: "brand".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema error: evaluation table is missing required column `brand`"
        );
        assert_eq!(err.stage(), "schema");
    }

    #[test]
    fn test_forest_errors_keep_stage() {
        let train = PipelineError::Training(ForestError::EmptyFeatures);
        let infer = PipelineError::Inference(ForestError::EmptyFeatures);
        assert_eq!(train.stage(), "train");
        assert_eq!(infer.stage(), "predict");
        assert!(train.to_string().starts_with("training error"));
    }
}
