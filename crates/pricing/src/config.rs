//! Pipeline configuration
//!
//! Defaults reproduce the fixed constants of a standard run. A TOML file can
//! override any subset of keys; everything it omits keeps its default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use autoprice_forest::ForestConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{PipelineError, Result};
use crate::evaluation::EvaluationConfig;
use crate::normalizer::default_sentinels;
use crate::schema::ListingSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub train: PathBuf,
    pub eval: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            train: PathBuf::from("train.csv"),
            eval: PathBuf::from("test.csv"),
            output: PathBuf::from("test_predictions.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub forest: ForestConfig,
    pub schema: ListingSchema,
    /// Column name to the value written into its absent cells
    pub sentinels: BTreeMap<String, String>,
    pub evaluation: EvaluationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            forest: ForestConfig::default(),
            schema: ListingSchema::default(),
            sentinels: default_sentinels(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: PipelineConfig = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;

        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("failed to serialize configuration: {e}")))
    }

    /// Hard errors for unusable settings; warnings for suspicious ones.
    pub fn validate(&self) -> Result<Vec<String>> {
        self.forest
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        self.schema.validate()?;

        let fraction = self.evaluation.holdout_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "holdout_fraction must be in (0, 1), got {fraction}"
            )));
        }

        let output = &self.paths.output;
        if *output == self.paths.train || *output == self.paths.eval {
            return Err(PipelineError::Config(format!(
                "output path {} would overwrite an input table",
                output.display()
            )));
        }

        let mut warnings = Vec::new();

        for column in self.sentinels.keys() {
            if !self.schema.categorical_columns.contains(column) {
                warnings.push(format!(
                    "sentinel column `{column}` is not a categorical feature"
                ));
            }
        }

        let n_features = self.schema.feature_columns().len();
        if let Some(k) = self.forest.tree.max_features {
            if k > n_features {
                warnings.push(format!(
                    "max_features {k} exceeds the {n_features} feature columns"
                ));
            }
        }

        if self.forest.n_trees < 10 {
            warnings.push(format!(
                "only {} trees configured, estimates will be noisy",
                self.forest.n_trees
            ));
        }

        if warnings.is_empty() {
            info!("Configuration validation passed");
        } else {
            warn!(?warnings, "Configuration validation warnings");
        }

        Ok(warnings)
    }
}
