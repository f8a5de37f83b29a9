//! Row-major feature matrix with a named, ordered column layout.
//!
//! The column names travel with the data so that a fitted model can refuse
//! a matrix whose layout differs from the one it was trained on.

use crate::errors::{ForestError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create an empty matrix with the given column layout.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a matrix from rows, checking every row against the layout width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut matrix = Self::new(columns);
        matrix.rows.reserve(rows.len());
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: Vec<f64>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ForestError::RowWidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        &self.rows[idx]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.rows[row][feature]
    }

    /// New matrix holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// First non-finite cell, if any. Encoded features must be plain numbers.
    pub fn find_non_finite(&self) -> Option<(usize, &str)> {
        self.rows.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|v| !v.is_finite())
                .map(|c| (r, self.columns[c].as_str()))
        })
    }

    /// Fail unless this matrix has exactly the `expected` column layout.
    pub fn ensure_layout(&self, expected: &[String]) -> Result<()> {
        if self.columns != expected {
            return Err(ForestError::LayoutMismatch {
                expected: expected.to_vec(),
                got: self.columns.clone(),
            });
        }
        Ok(())
    }
}
