//! Column roles of the listing tables

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::table::{ListingTable, TableKind};

/// Names the identifier, target, categorical and numeric columns. The
/// feature layout is the categorical columns followed by the numeric
/// columns, each in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingSchema {
    pub id_column: String,
    pub target_column: String,
    pub categorical_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
}

impl Default for ListingSchema {
    fn default() -> Self {
        let names = |cols: &[&str]| -> Vec<String> { cols.iter().map(|c| c.to_string()).collect() };
        Self {
            id_column: "id".to_string(),
            target_column: "price".to_string(),
            categorical_columns: names(&[
                "brand",
                "model",
                "fuel_type",
                "engine",
                "transmission",
                "ext_col",
                "int_col",
                "accident",
                "clean_title",
            ]),
            numeric_columns: names(&["model_year", "milage"]),
        }
    }
}

impl ListingSchema {
    pub fn feature_columns(&self) -> Vec<String> {
        self.categorical_columns
            .iter()
            .chain(&self.numeric_columns)
            .cloned()
            .collect()
    }

    /// Columns a table of the given kind must carry. Only training tables
    /// need the target.
    pub fn required_columns(&self, kind: TableKind) -> Vec<&str> {
        let mut cols = vec![self.id_column.as_str()];
        cols.extend(self.categorical_columns.iter().map(String::as_str));
        cols.extend(self.numeric_columns.iter().map(String::as_str));
        if kind == TableKind::Training {
            cols.push(self.target_column.as_str());
        }
        cols
    }

    pub fn check_table(&self, table: &ListingTable) -> Result<()> {
        table.require_columns(self.required_columns(table.kind()))
    }

    /// Every column may play exactly one role, and there must be at least
    /// one feature.
    pub fn validate(&self) -> Result<()> {
        if self.categorical_columns.is_empty() && self.numeric_columns.is_empty() {
            return Err(PipelineError::Config(
                "schema declares no feature columns".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let all = [&self.id_column, &self.target_column]
            .into_iter()
            .chain(&self.categorical_columns)
            .chain(&self.numeric_columns);
        for column in all {
            if column.is_empty() {
                return Err(PipelineError::Config("schema has an empty column name".to_string()));
            }
            if !seen.insert(column.as_str()) {
                return Err(PipelineError::Config(format!(
                    "column `{column}` is assigned more than one role"
                )));
            }
        }

        Ok(())
    }
}
