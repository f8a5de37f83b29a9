//! Unified categorical encoder
//!
//! Category codes are learned from the union of every table that will be
//! encoded, so a value that only occurs in the evaluation table still has a
//! code. Building is two-phase: a [`CategoryCodeTableBuilder`] collects the
//! distinct values of each categorical column, then [`freeze`] turns it into
//! an immutable [`CategoryCodeTable`] that is passed explicitly to every
//! stage that encodes rows.
//!
//! Codes are dense and follow the byte-wise lexicographic order of the
//! distinct values, so the same input union always yields the same codes.
//!
//! [`freeze`]: CategoryCodeTableBuilder::freeze

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::table::{ListingTable, TableKind};

/// Category used for an absent cell in a column without a sentinel.
pub const MISSING_CATEGORY: &str = "nan";

#[derive(Debug, Clone, Default)]
pub struct CategoryCodeTableBuilder {
    columns: Vec<String>,
    domains: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryCodeTableBuilder {
    pub fn new(columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
            domains: columns
                .iter()
                .map(|c| (c.clone(), BTreeSet::new()))
                .collect(),
        }
    }

    /// Add every value of the tracked columns in `table` to the domains.
    pub fn observe(&mut self, table: &ListingTable) -> Result<()> {
        for column in &self.columns {
            let idx = table.column_index(column)?;
            let domain = self.domains.entry(column.clone()).or_default();
            for value in table.column_values(idx) {
                let value = value.unwrap_or(MISSING_CATEGORY);
                if !domain.contains(value) {
                    domain.insert(value.to_string());
                }
            }
        }
        debug!(table = %table.kind(), rows = table.len(), "observed categorical values");
        Ok(())
    }

    pub fn freeze(self) -> CategoryCodeTable {
        let codes = self
            .domains
            .into_iter()
            .map(|(column, values)| {
                let mapping = values
                    .into_iter()
                    .enumerate()
                    .map(|(code, value)| (value, code as u32))
                    .collect();
                (column, mapping)
            })
            .collect();

        CategoryCodeTable {
            columns: self.columns,
            codes,
        }
    }
}

/// Read-only mapping from (column, raw value) to a dense integer code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCodeTable {
    columns: Vec<String>,
    codes: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CategoryCodeTable {
    /// Collect the union of `columns` over all `tables` and freeze it.
    pub fn fit_union(columns: &[String], tables: &[&ListingTable]) -> Result<Self> {
        let mut builder = CategoryCodeTableBuilder::new(columns);
        for table in tables {
            builder.observe(table)?;
        }
        let frozen = builder.freeze();

        for column in &frozen.columns {
            debug!(column = %column, categories = frozen.cardinality(column), "category codes");
        }
        info!(
            columns = frozen.columns.len(),
            categories = frozen.codes.values().map(BTreeMap::len).sum::<usize>(),
            "built category code table"
        );
        Ok(frozen)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn code(&self, column: &str, value: &str) -> Option<u32> {
        self.codes.get(column)?.get(value).copied()
    }

    /// Code for a cell of `table`. An absent cell maps to
    /// [`MISSING_CATEGORY`]. A value without a code means the table was not
    /// part of the union and is reported as an encoding error.
    pub fn encode(&self, table: TableKind, column: &str, value: Option<&str>) -> Result<u32> {
        let value = value.unwrap_or(MISSING_CATEGORY);
        self.code(column, value)
            .ok_or_else(|| PipelineError::Encoding {
                table,
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    pub fn cardinality(&self, column: &str) -> usize {
        self.codes.get(column).map_or(0, BTreeMap::len)
    }

    /// Distinct values of `column` in code order.
    pub fn categories(&self, column: &str) -> Vec<&str> {
        let Some(mapping) = self.codes.get(column) else {
            return Vec::new();
        };
        let mut values: Vec<(&str, u32)> = mapping.iter().map(|(v, &c)| (v.as_str(), c)).collect();
        values.sort_by_key(|&(_, code)| code);
        values.into_iter().map(|(v, _)| v).collect()
    }

    pub fn cardinalities(&self) -> BTreeMap<String, usize> {
        self.codes
            .iter()
            .map(|(column, mapping)| (column.clone(), mapping.len()))
            .collect()
    }
}
