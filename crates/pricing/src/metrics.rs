//! Regression metrics for holdout reports

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Metrics of `predicted` against `actual`. Both slices have equal,
    /// non-zero length.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        debug_assert_eq!(actual.len(), predicted.len());
        let n = actual.len().max(1) as f64;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (y, p) in actual.iter().zip(predicted) {
            abs_sum += (y - p).abs();
            sq_sum += (y - p).powi(2);
        }

        let mean = actual.iter().sum::<f64>() / n;
        let total: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();

        // A constant target scores 1.0 only on a perfect fit.
        let r2 = if total == 0.0 {
            if sq_sum == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - sq_sum / total
        };

        Self {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            r2,
        }
    }
}
