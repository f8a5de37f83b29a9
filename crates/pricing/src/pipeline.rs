//! End-to-end pricing run
//!
//! normalize -> encode(train, eval) -> train -> predict -> format/write.
//! Each stage consumes its whole input before the next one starts, and the
//! result file is only written once every stage has succeeded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use autoprice_forest::{DecisionTree, RandomForest, Regressor};
use tracing::info;

use crate::config::PipelineConfig;
use crate::encoder::CategoryCodeTable;
use crate::errors::Result;
use crate::evaluation::{holdout_split, score_model, HoldoutReport};
use crate::features::{encode_table, EncodedTable};
use crate::normalizer::MissingValueNormalizer;
use crate::output::{write_all_atomic, write_atomic, PredictionResult};
use crate::predictor::predict_prices;
use crate::table::{ListingTable, TableKind};
use crate::trainer::fit_estimator;

/// Both tables mapped through one code table.
#[derive(Debug, Clone)]
pub struct PreparedTables {
    pub codes: CategoryCodeTable,
    pub training: EncodedTable,
    pub evaluation: EncodedTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub training_rows: usize,
    pub evaluation_rows: usize,
    pub feature_columns: Vec<String>,
    pub cardinalities: BTreeMap<String, usize>,
    pub output_path: PathBuf,
    /// BLAKE3 hex digest of the written result file
    pub output_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub fit_rows: usize,
    pub holdout_rows: usize,
    pub metrics_path: PathBuf,
    pub predictions_path: PathBuf,
}

pub struct PricingPipeline {
    config: PipelineConfig,
    normalizer: MissingValueNormalizer,
}

impl PricingPipeline {
    /// Validate the configuration and set up the stages.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = MissingValueNormalizer::new(config.sentinels.clone());
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn load_inputs(&self) -> Result<(ListingTable, ListingTable)> {
        let paths = &self.config.paths;
        let training = ListingTable::from_path(&paths.train, TableKind::Training)?;
        let evaluation = ListingTable::from_path(&paths.eval, TableKind::Evaluation)?;
        Ok((training, evaluation))
    }

    /// Load both tables, predict, and write the result file.
    pub fn run(&self) -> Result<RunSummary> {
        let (training, evaluation) = self.load_inputs()?;
        let prepared = self.prepare(training, evaluation)?;
        let result = self.predict_prepared(&prepared)?;

        let bytes = result.to_csv_bytes()?;
        let output_path = self.config.paths.output.clone();
        let output_digest = write_atomic(&output_path, &bytes)?;

        info!(
            rows = result.len(),
            path = %output_path.display(),
            digest = %output_digest,
            "pricing run complete"
        );

        Ok(RunSummary {
            training_rows: prepared.training.len(),
            evaluation_rows: prepared.evaluation.len(),
            feature_columns: prepared.training.features.columns().to_vec(),
            cardinalities: prepared.codes.cardinalities(),
            output_path,
            output_digest,
        })
    }

    /// Schema check, normalization and union-fit encoding of both tables.
    /// Schema errors surface before anything is encoded.
    pub fn prepare(
        &self,
        mut training: ListingTable,
        mut evaluation: ListingTable,
    ) -> Result<PreparedTables> {
        let schema = &self.config.schema;
        schema.check_table(&training)?;
        schema.check_table(&evaluation)?;

        self.normalizer.apply(&mut training)?;
        self.normalizer.apply(&mut evaluation)?;

        let codes =
            CategoryCodeTable::fit_union(&schema.categorical_columns, &[&training, &evaluation])?;

        let training = encode_table(&training, schema, &codes)?;
        let evaluation = encode_table(&evaluation, schema, &codes)?;

        Ok(PreparedTables {
            codes,
            training,
            evaluation,
        })
    }

    /// Fit the forest on the training rows and estimate every evaluation row.
    pub fn predict_prepared(&self, prepared: &PreparedTables) -> Result<PredictionResult> {
        let forest = RandomForest::new(self.config.forest.clone());
        let model = fit_estimator(&forest, &prepared.training)?;
        let prices = predict_prices(&model, &prepared.evaluation)?;
        PredictionResult::from_parts(prepared.evaluation.ids.clone(), prices)
    }

    /// In-memory run over already loaded tables; nothing is written.
    pub fn predict_tables(
        &self,
        training: ListingTable,
        evaluation: ListingTable,
    ) -> Result<PredictionResult> {
        let prepared = self.prepare(training, evaluation)?;
        self.predict_prepared(&prepared)
    }

    /// Score the forest and a single reference tree on a seeded holdout of
    /// the training rows and build the comparison tables.
    pub fn holdout_report(&self, prepared: &PreparedTables) -> Result<HoldoutReport> {
        let training = &prepared.training;
        let split = holdout_split(
            training.len(),
            self.config.evaluation.holdout_fraction,
            self.config.forest.seed,
        )?;
        let fit = training.select_rows(&split.fit);
        let holdout = training.select_rows(&split.holdout);

        info!(
            fit_rows = fit.len(),
            holdout_rows = holdout.len(),
            "holdout split"
        );

        let forest = RandomForest::new(self.config.forest.clone());
        let tree = DecisionTree::new(self.config.forest.tree.clone(), self.config.forest.seed);

        let scores = vec![
            score_model(&forest, &fit, &holdout)?,
            score_model(&tree, &fit, &holdout)?,
        ];

        Ok(HoldoutReport {
            ids: holdout.ids.clone(),
            actual: holdout.targets.clone().unwrap_or_default(),
            scores,
        })
    }

    /// Load both tables, run the holdout report and write both files.
    pub fn evaluate(&self) -> Result<EvaluationSummary> {
        let (training, evaluation) = self.load_inputs()?;
        let prepared = self.prepare(training, evaluation)?;
        let report = self.holdout_report(&prepared)?;

        let metrics = report.metrics_csv()?;
        let predictions = report.predictions_csv()?;

        let eval_config = &self.config.evaluation;
        write_all_atomic(&[
            (eval_config.metrics_path.as_path(), metrics.as_slice()),
            (eval_config.predictions_path.as_path(), predictions.as_slice()),
        ])?;

        Ok(EvaluationSummary {
            fit_rows: prepared.training.len() - report.ids.len(),
            holdout_rows: report.ids.len(),
            metrics_path: eval_config.metrics_path.clone(),
            predictions_path: eval_config.predictions_path.clone(),
        })
    }
}

/// Names of the models compared by [`PricingPipeline::holdout_report`].
pub fn report_model_names(config: &PipelineConfig) -> Vec<String> {
    vec![
        RandomForest::new(config.forest.clone()).name().to_string(),
        DecisionTree::new(config.forest.tree.clone(), config.forest.seed)
            .name()
            .to_string(),
    ]
}
