//! Batch predictor stage

use autoprice_forest::Predictor;
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::features::EncodedTable;

/// Integer price for a raw estimate: truncation toward zero.
pub fn to_integer_price(estimate: f64) -> i64 {
    estimate.trunc() as i64
}

/// One integer estimate per evaluation row, in row order. The model checks
/// the feature layout before evaluating anything.
pub fn predict_prices<P: Predictor>(model: &P, evaluation: &EncodedTable) -> Result<Vec<i64>> {
    let estimates = model
        .predict(&evaluation.features)
        .map_err(PipelineError::Inference)?;

    info!(rows = estimates.len(), "predicted prices");
    Ok(estimates.into_iter().map(to_integer_price).collect())
}
