//! Result formatter and writer
//!
//! Pairs evaluation identifiers with integer estimates and writes them as
//! `id,price` rows in input order. Files are written through a temporary
//! file in the destination directory and renamed into place, so a failed
//! run never leaves a partial result behind.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePrediction {
    pub id: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredictionResult {
    rows: Vec<PricePrediction>,
}

impl PredictionResult {
    /// Zip identifiers and prices. Lengths must agree and identifiers must
    /// be unique.
    pub fn from_parts(ids: Vec<String>, prices: Vec<i64>) -> Result<Self> {
        if ids.len() != prices.len() {
            return Err(PipelineError::Format(format!(
                "{} identifiers but {} predictions",
                ids.len(),
                prices.len()
            )));
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(PipelineError::Format(format!("duplicate identifier `{id}`")));
            }
        }

        Ok(Self {
            rows: ids
                .into_iter()
                .zip(prices)
                .map(|(id, price)| PricePrediction { id, price })
                .collect(),
        })
    }

    pub fn rows(&self) -> &[PricePrediction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialized `id,price` table. The header is written even when there
    /// are no rows.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["id", "price"])
            .map_err(|e| csv_error("result", e))?;
        for row in &self.rows {
            let price = row.price.to_string();
            writer
                .write_record([row.id.as_str(), price.as_str()])
                .map_err(|e| csv_error("result", e))?;
        }
        finish(writer, "result")
    }
}

pub(crate) fn csv_error(origin: &str, source: csv::Error) -> PipelineError {
    PipelineError::Csv {
        origin: origin.to_string(),
        source,
    }
}

pub(crate) fn finish(writer: csv::Writer<Vec<u8>>, origin: &str) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| PipelineError::Format(format!("failed to flush {origin} table: {e}")))
}

/// BLAKE3 digest of `bytes`, hex encoded.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Bytes sitting in a temporary file next to their destination. Dropping it
/// removes the temporary file; nothing appears under the final name until
/// [`StagedFile::persist`].
pub struct StagedFile {
    path: PathBuf,
    tmp: NamedTempFile,
    digest: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename into place and return the digest of the content.
    pub fn persist(self) -> Result<String> {
        let Self { path, tmp, digest } = self;
        tmp.persist(&path).map_err(|e| PipelineError::Io {
            path: path.display().to_string(),
            source: e.error,
        })?;
        info!(path = %path.display(), digest = %digest, "wrote file");
        Ok(digest)
    }
}

/// Write `bytes` to a temporary file in the directory of `path`.
pub fn stage_file(path: &Path, bytes: &[u8]) -> Result<StagedFile> {
    let io_err = |source: std::io::Error| PipelineError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;

    debug!(path = %path.display(), bytes = bytes.len(), "staged file");
    Ok(StagedFile {
        path: path.to_path_buf(),
        tmp,
        digest: digest_hex(bytes),
    })
}

/// Write `bytes` to `path` atomically and return their digest.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<String> {
    stage_file(path, bytes)?.persist()
}

/// Stage every file first and rename them only once all of them were
/// written, so a failure leaves none of them behind.
pub fn write_all_atomic(files: &[(&Path, &[u8])]) -> Result<Vec<String>> {
    let staged = files
        .iter()
        .map(|(path, bytes)| stage_file(path, bytes))
        .collect::<Result<Vec<_>>>()?;
    staged.into_iter().map(StagedFile::persist).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_csv_layout() {
        let result = PredictionResult::from_parts(ids(&["188533", "188534"]), vec![17005, 80000])
            .unwrap();
        let text = String::from_utf8(result.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(text, "id,price\n188533,17005\n188534,80000\n");
    }

    #[test]
    fn test_empty_result_still_has_header() {
        let text = String::from_utf8(PredictionResult::default().to_csv_bytes().unwrap()).unwrap();
        assert_eq!(text, "id,price\n");
    }

    #[test]
    fn test_identifiers_kept_verbatim() {
        let result = PredictionResult::from_parts(ids(&["007", "a,b"]), vec![1, 2]).unwrap();
        let text = String::from_utf8(result.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(text, "id,price\n007,1\n\"a,b\",2\n");
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(matches!(
            PredictionResult::from_parts(ids(&["1"]), vec![]),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        assert!(matches!(
            PredictionResult::from_parts(ids(&["1", "1"]), vec![5, 6]),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let digest = write_atomic(&path, b"id,price\n1,2\n").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"id,price\n1,2\n");
        assert_eq!(digest, digest_hex(b"id,price\n1,2\n"));
        assert_eq!(digest.len(), 64);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(matches!(
            write_atomic(&path, b"x"),
            Err(PipelineError::Io { .. })
        ));
    }

    #[test]
    fn test_write_all_atomic_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("model_metrics.csv");
        let second = dir.path().join("missing").join("model_predictions.csv");

        let result = write_all_atomic(&[
            (first.as_path(), &b"a"[..]),
            (second.as_path(), &b"b"[..]),
        ]);

        assert!(matches!(result, Err(PipelineError::Io { .. })));
        assert!(!first.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_all_atomic_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");

        let digests = write_all_atomic(&[
            (first.as_path(), &b"one"[..]),
            (second.as_path(), &b"two"[..]),
        ])
        .unwrap();

        assert_eq!(digests, vec![digest_hex(b"one"), digest_hex(b"two")]);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
