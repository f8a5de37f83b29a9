//! Capability interface over the concrete tree algorithms.
//!
//! The pipeline only talks to [`Regressor`] and [`Predictor`], so the
//! ensemble can be swapped without touching the stages around it.

use crate::errors::{ForestError, Result};
use crate::matrix::FeatureMatrix;

/// Something that can be fitted on a feature matrix and a target vector.
pub trait Regressor {
    type Model: Predictor;

    /// Display name used in reports.
    fn name(&self) -> &str;

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Self::Model>;
}

/// A fitted model. Owns the column layout it was trained on.
pub trait Predictor {
    fn feature_names(&self) -> &[String];

    /// Raw estimate for one row already known to match the layout.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// One estimate per row, in row order. The layout check happens before
    /// any row is evaluated.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        features.ensure_layout(self.feature_names())?;
        if let Some((row, column)) = features.find_non_finite() {
            return Err(ForestError::NonFiniteFeature {
                row,
                column: column.to_string(),
            });
        }

        features
            .rows()
            .enumerate()
            .map(|(row, values)| {
                let estimate = self.predict_row(values);
                if estimate.is_finite() {
                    Ok(estimate)
                } else {
                    Err(ForestError::NonFiniteEstimate { row })
                }
            })
            .collect()
    }
}

/// Shared input checks for every [`Regressor::fit`].
pub fn validate_training_data(features: &FeatureMatrix, targets: &[f64]) -> Result<()> {
    if features.is_empty() || features.n_features() == 0 {
        return Err(ForestError::EmptyFeatures);
    }

    if targets.len() != features.n_rows() {
        return Err(ForestError::TargetLengthMismatch {
            rows: features.n_rows(),
            targets: targets.len(),
        });
    }

    if let Some((row, column)) = features.find_non_finite() {
        return Err(ForestError::NonFiniteFeature {
            row,
            column: column.to_string(),
        });
    }

    if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
        return Err(ForestError::NonFiniteTarget { row });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    struct Constant {
        names: Vec<String>,
        value: f64,
    }

    impl Predictor for Constant {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_row(&self, _row: &[f64]) -> f64 {
            self.value
        }
    }

    #[test]
    fn test_validate_empty() {
        let m = FeatureMatrix::new(cols());
        assert_eq!(validate_training_data(&m, &[]), Err(ForestError::EmptyFeatures));
    }

    #[test]
    fn test_validate_length_mismatch() {
        let m = FeatureMatrix::from_rows(cols(), vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            validate_training_data(&m, &[1.0, 2.0]),
            Err(ForestError::TargetLengthMismatch { rows: 1, targets: 2 })
        );
    }

    #[test]
    fn test_validate_non_finite() {
        let m = FeatureMatrix::from_rows(cols(), vec![vec![1.0, f64::INFINITY]]).unwrap();
        assert_eq!(
            validate_training_data(&m, &[1.0]),
            Err(ForestError::NonFiniteFeature {
                row: 0,
                column: "b".to_string()
            })
        );

        let m = FeatureMatrix::from_rows(cols(), vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            validate_training_data(&m, &[f64::NAN]),
            Err(ForestError::NonFiniteTarget { row: 0 })
        );
    }

    #[test]
    fn test_predict_checks_layout_first() {
        let model = Constant {
            names: cols(),
            value: 1.0,
        };
        let swapped = FeatureMatrix::from_rows(
            vec!["b".to_string(), "a".to_string()],
            vec![vec![1.0, 2.0]],
        )
        .unwrap();

        assert!(matches!(
            model.predict(&swapped),
            Err(ForestError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_rejects_non_finite_estimate() {
        let model = Constant {
            names: cols(),
            value: f64::NAN,
        };
        let m = FeatureMatrix::from_rows(cols(), vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(model.predict(&m), Err(ForestError::NonFiniteEstimate { row: 0 }));
    }
}
