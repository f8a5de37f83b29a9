//! Encoded feature vectors
//!
//! Turns a normalized listing table into a [`FeatureMatrix`] whose column
//! layout is [`ListingSchema::feature_columns`]: category codes first, then
//! numeric values passed through. Identifier and target are split off.

use autoprice_forest::FeatureMatrix;
use tracing::{debug, info};

use crate::encoder::CategoryCodeTable;
use crate::errors::{PipelineError, Result};
use crate::schema::ListingSchema;
use crate::table::{ListingTable, TableKind};

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    pub kind: TableKind,
    /// Identifiers verbatim, in input row order
    pub ids: Vec<String>,
    pub features: FeatureMatrix,
    /// Present for training tables only
    pub targets: Option<Vec<f64>>,
}

impl EncodedTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Subset of rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            kind: self.kind,
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            features: self.features.select_rows(indices),
            targets: self
                .targets
                .as_ref()
                .map(|t| indices.iter().map(|&i| t[i]).collect()),
        }
    }
}

/// Encode every row of `table`. Numeric cells must parse as finite numbers;
/// nothing is coerced.
pub fn encode_table(
    table: &ListingTable,
    schema: &ListingSchema,
    codes: &CategoryCodeTable,
) -> Result<EncodedTable> {
    let kind = table.kind();
    let id_idx = table.column_index(&schema.id_column)?;
    let categorical = resolve(table, &schema.categorical_columns)?;
    let numeric = resolve(table, &schema.numeric_columns)?;
    let target_idx = match kind {
        TableKind::Training => Some(table.column_index(&schema.target_column)?),
        TableKind::Evaluation => None,
    };

    for header in table.headers() {
        let used = *header == schema.id_column
            || *header == schema.target_column
            || schema.categorical_columns.contains(header)
            || schema.numeric_columns.contains(header);
        if !used {
            debug!(table = %kind, column = %header, "ignoring column outside schema");
        }
    }

    let mut ids = Vec::with_capacity(table.len());
    let mut features = FeatureMatrix::new(schema.feature_columns());
    let mut targets = target_idx.map(|_| Vec::with_capacity(table.len()));

    for row in 0..table.len() {
        let id = table
            .cell(row, id_idx)
            .ok_or_else(|| invalid(kind, row, &schema.id_column, "missing identifier"))?;
        ids.push(id.to_string());

        let mut values = Vec::with_capacity(categorical.len() + numeric.len());
        for (column, idx) in &categorical {
            let code = codes.encode(kind, column, table.cell(row, *idx))?;
            values.push(code as f64);
        }
        for (column, idx) in &numeric {
            values.push(parse_number(kind, row, column, table.cell(row, *idx))?);
        }
        features.push_row(values).map_err(|e| PipelineError::Format(e.to_string()))?;

        if let (Some(idx), Some(targets)) = (target_idx, targets.as_mut()) {
            targets.push(parse_number(kind, row, &schema.target_column, table.cell(row, idx))?);
        }
    }

    info!(
        table = %kind,
        rows = ids.len(),
        features = features.n_features(),
        "encoded table"
    );

    Ok(EncodedTable {
        kind,
        ids,
        features,
        targets,
    })
}

fn resolve<'a>(table: &ListingTable, columns: &'a [String]) -> Result<Vec<(&'a str, usize)>> {
    columns
        .iter()
        .map(|c| -> Result<(&'a str, usize)> { Ok((c.as_str(), table.column_index(c)?)) })
        .collect()
}

fn parse_number(kind: TableKind, row: usize, column: &str, cell: Option<&str>) -> Result<f64> {
    let raw = cell.ok_or_else(|| invalid(kind, row, column, "missing numeric value"))?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(
            kind,
            row,
            column,
            &format!("`{raw}` is not a finite number"),
        )),
    }
}

fn invalid(kind: TableKind, row: usize, column: &str, reason: &str) -> PipelineError {
    PipelineError::InvalidValue {
        table: kind,
        row: row + 1,
        column: column.to_string(),
        reason: reason.to_string(),
    }
}
