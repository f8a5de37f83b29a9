//! Estimator trainer stage

use autoprice_forest::{ForestError, Regressor};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::features::EncodedTable;

/// Fit `regressor` on an encoded training table. The fitted model is owned
/// by the caller and only lent to the predictor.
pub fn fit_estimator<R: Regressor>(regressor: &R, training: &EncodedTable) -> Result<R::Model> {
    let targets = training.targets.as_deref().ok_or(PipelineError::Training(
        ForestError::TargetLengthMismatch {
            rows: training.len(),
            targets: 0,
        },
    ))?;

    let model = regressor
        .fit(&training.features, targets)
        .map_err(PipelineError::Training)?;

    info!(
        model = regressor.name(),
        rows = training.len(),
        "fitted estimator"
    );
    Ok(model)
}
