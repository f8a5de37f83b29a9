//! Holdout evaluation
//!
//! Splits the encoded training table into fit and holdout parts, scores each
//! model on the holdout part and renders the two comparison tables read by
//! the reporting dashboard: per-model metrics and per-row predictions.

use std::path::PathBuf;

use autoprice_forest::{sample_without_replacement, seeded_rng, ForestError, Predictor, Regressor};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::features::EncodedTable;
use crate::metrics::RegressionMetrics;
use crate::output::{csv_error, finish};
use crate::trainer::fit_estimator;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Share of training rows held out, in (0, 1)
    pub holdout_fraction: f64,
    pub metrics_path: PathBuf,
    pub predictions_path: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            metrics_path: PathBuf::from("model_metrics.csv"),
            predictions_path: PathBuf::from("model_predictions.csv"),
        }
    }
}

/// Row indices of each side of the split, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutSplit {
    pub fit: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Seeded draw of `ceil(n * fraction)` rows without replacement for the
/// holdout; the rest are fit rows.
/// Both sides always keep at least one row.
pub fn holdout_split(n_rows: usize, fraction: f64, seed: u64) -> Result<HoldoutSplit> {
    if n_rows < 2 {
        return Err(PipelineError::Training(ForestError::InvalidParameters(format!(
            "holdout evaluation needs at least 2 training rows, got {n_rows}"
        ))));
    }

    let n_holdout = ((n_rows as f64 * fraction).ceil() as usize).clamp(1, n_rows - 1);
    let holdout = sample_without_replacement(&mut seeded_rng(seed), n_rows, n_holdout);

    let mut in_holdout = vec![false; n_rows];
    for &row in &holdout {
        in_holdout[row] = true;
    }
    let fit = (0..n_rows).filter(|&row| !in_holdout[row]).collect();

    Ok(HoldoutSplit { fit, holdout })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    pub name: String,
    pub metrics: RegressionMetrics,
    pub predictions: Vec<f64>,
}

/// Fit on `fit`, predict `holdout`, compare against its targets.
pub fn score_model<R: Regressor>(
    regressor: &R,
    fit: &EncodedTable,
    holdout: &EncodedTable,
) -> Result<ModelScore> {
    let model = fit_estimator(regressor, fit)?;
    let predictions = model
        .predict(&holdout.features)
        .map_err(PipelineError::Inference)?;
    let actual = holdout
        .targets
        .as_deref()
        .ok_or_else(|| PipelineError::Format("holdout rows carry no targets".to_string()))?;

    let metrics = RegressionMetrics::compute(actual, &predictions);
    info!(
        model = regressor.name(),
        mae = metrics.mae,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "scored model on holdout"
    );

    Ok(ModelScore {
        name: regressor.name().to_string(),
        metrics,
        predictions,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutReport {
    pub ids: Vec<String>,
    pub actual: Vec<f64>,
    pub scores: Vec<ModelScore>,
}

impl HoldoutReport {
    /// Model name in an unnamed first column, then `MAE,RMSE,R2`.
    pub fn metrics_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["", "MAE", "RMSE", "R2"])
            .map_err(|e| csv_error("metrics", e))?;
        for score in &self.scores {
            let m = &score.metrics;
            writer
                .write_record([
                    score.name.clone(),
                    m.mae.to_string(),
                    m.rmse.to_string(),
                    m.r2.to_string(),
                ])
                .map_err(|e| csv_error("metrics", e))?;
        }
        finish(writer, "metrics")
    }

    /// `id,actual` followed by one column per model name.
    pub fn predictions_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["id".to_string(), "actual".to_string()];
        header.extend(self.scores.iter().map(|s| s.name.clone()));
        writer
            .write_record(&header)
            .map_err(|e| csv_error("predictions", e))?;

        for (row, id) in self.ids.iter().enumerate() {
            let mut record = vec![id.clone(), self.actual[row].to_string()];
            record.extend(self.scores.iter().map(|s| s.predictions[row].to_string()));
            writer
                .write_record(&record)
                .map_err(|e| csv_error("predictions", e))?;
        }
        finish(writer, "predictions")
    }
}
