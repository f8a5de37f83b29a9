//! Delimited listing tables
//!
//! Loads a header-first delimited file into owned string cells. Cells equal
//! to one of the usual missing-value markers are stored as `None`; nothing
//! else is interpreted here.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::errors::{PipelineError, Result};

/// Markers read as an absent cell, matching common dataframe loaders.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

/// Which input a table came from. Carried into every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Training,
    Evaluation,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Training => write!(f, "training"),
            TableKind::Evaluation => write!(f, "evaluation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingTable {
    kind: TableKind,
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ListingTable {
    /// Build a table from in-memory cells. Every row must match the header
    /// width.
    pub fn new(
        kind: TableKind,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PipelineError::InvalidValue {
                    table: kind,
                    row: i + 1,
                    column: "*".to_string(),
                    reason: format!("expected {} cells, found {}", headers.len(), row.len()),
                });
            }
        }
        Ok(Self {
            kind,
            headers,
            rows,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, kind: TableKind) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| PipelineError::Io {
            path: origin.clone(),
            source,
        })?;

        let table = Self::from_reader(file, kind, &origin)?;
        info!(
            table = %kind,
            path = %origin,
            rows = table.len(),
            columns = table.headers.len(),
            "loaded table"
        );
        Ok(table)
    }

    /// Parse delimited text with a header row. Ragged rows are rejected.
    pub fn from_reader<R: Read>(reader: R, kind: TableKind, origin: &str) -> Result<Self> {
        let csv_err = |source: csv::Error| PipelineError::Csv {
            origin: origin.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!is_missing_token(cell)).then(|| cell.to_string()))
                    .collect(),
            );
        }

        Ok(Self {
            kind,
            headers,
            rows,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Position of `name` in the header, or a schema error naming the table.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::Schema {
                table: self.kind,
                column: name.to_string(),
            })
    }

    pub fn require_columns<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.column_index(name)?;
        }
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows[row][column].as_deref()
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row[column].as_deref())
    }

    /// Replace absent cells of one column with `value`; returns how many
    /// cells were filled.
    pub fn fill_missing(&mut self, column: usize, value: &str) -> usize {
        let mut filled = 0;
        for row in &mut self.rows {
            if row[column].is_none() {
                row[column] = Some(value.to_string());
                filled += 1;
            }
        }
        filled
    }
}
