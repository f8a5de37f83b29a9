//! Missing-value normalizer
//!
//! Fills absent cells of selected categorical columns with a fixed sentinel
//! per column. Applied to each table independently; other columns are left
//! untouched.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::errors::Result;
use crate::table::ListingTable;

/// Sentinels used for listing data: unknown fuel type, no reported accident,
/// unknown title status.
pub fn default_sentinels() -> BTreeMap<String, String> {
    [
        ("fuel_type", "Unknown"),
        ("accident", "None reported"),
        ("clean_title", "Unknown"),
    ]
    .into_iter()
    .map(|(c, v)| (c.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValueNormalizer {
    sentinels: BTreeMap<String, String>,
}

impl Default for MissingValueNormalizer {
    fn default() -> Self {
        Self::new(default_sentinels())
    }
}

impl MissingValueNormalizer {
    pub fn new(sentinels: BTreeMap<String, String>) -> Self {
        Self { sentinels }
    }

    pub fn sentinels(&self) -> &BTreeMap<String, String> {
        &self.sentinels
    }

    /// Fill the table in place. Returns the number of cells filled per
    /// column. A sentinel column absent from the table is a schema error.
    pub fn apply(&self, table: &mut ListingTable) -> Result<BTreeMap<String, usize>> {
        let mut report = BTreeMap::new();

        for (column, sentinel) in &self.sentinels {
            let idx = table.column_index(column)?;
            let filled = table.fill_missing(idx, sentinel);
            debug!(table = %table.kind(), column = %column, filled, "filled missing values");
            report.insert(column.clone(), filled);
        }

        info!(
            table = %table.kind(),
            filled = report.values().sum::<usize>(),
            "normalized missing categorical values"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::table::TableKind;

    fn table(kind: TableKind, rows: Vec<[Option<&str>; 4]>) -> ListingTable {
        ListingTable::new(
            kind,
            ["id", "fuel_type", "accident", "clean_title"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.into_iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_fills_each_column_with_its_sentinel() {
        let mut t = table(
            TableKind::Evaluation,
            vec![[Some("2"), None, None, None]],
        );
        let report = MissingValueNormalizer::default().apply(&mut t).unwrap();

        assert_eq!(t.cell(0, 1), Some("Unknown"));
        assert_eq!(t.cell(0, 2), Some("None reported"));
        assert_eq!(t.cell(0, 3), Some("Unknown"));
        assert_eq!(report["fuel_type"], 1);
    }

    #[test]
    fn test_present_values_untouched() {
        let mut t = table(
            TableKind::Training,
            vec![[Some("1"), Some("Gas"), None, Some("Yes")]],
        );
        MissingValueNormalizer::default().apply(&mut t).unwrap();

        assert_eq!(t.cell(0, 0), Some("1"));
        assert_eq!(t.cell(0, 1), Some("Gas"));
        assert_eq!(t.cell(0, 2), Some("None reported"));
        assert_eq!(t.cell(0, 3), Some("Yes"));
    }

    #[test]
    fn test_missing_sentinel_column_is_schema_error() {
        let mut t = ListingTable::new(TableKind::Training, vec!["id".to_string()], vec![]).unwrap();
        let err = MissingValueNormalizer::default().apply(&mut t).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }
}
