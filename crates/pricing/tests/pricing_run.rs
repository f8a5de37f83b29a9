use std::fs;
use std::path::{Path, PathBuf};

use autoprice::{digest_hex, PipelineConfig, PipelineError, PricingPipeline, TableKind};
use tempfile::TempDir;

const HEADER: &str = "id,brand,model,model_year,milage,fuel_type,engine,transmission,ext_col,int_col,accident,clean_title";

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn config_for(dir: &Path, train: &str, eval: &str) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.paths.train = write(dir, "train.csv", train);
    config.paths.eval = write(dir, "test.csv", eval);
    config.paths.output = dir.join("test_predictions.csv");
    config.evaluation.metrics_path = dir.join("model_metrics.csv");
    config.evaluation.predictions_path = dir.join("model_predictions.csv");
    config.forest.n_trees = 10;
    config
}

fn training_text() -> String {
    let rows = [
        "0,Ford,F-150 XLT,2016,81000,Gasoline,3.5L V6,A/T,White,Black,None reported,Yes,24500",
        "1,Ford,Mustang GT,2019,32000,Gasoline,5.0L V8,6-Speed M/T,Red,Black,None reported,Yes,35900",
        "2,Toyota,Camry LE,2012,140000,Gasoline,2.5L I4,A/T,Silver,Gray,At least 1 accident or damage reported,Yes,8900",
        "3,Toyota,Prius,2015,99000,Hybrid,1.8L I4,CVT,Blue,Gray,,Yes,12500",
        "4,Tesla,Model 3 Long Range,2020,28000,,Electric Motor,A/T,Black,White,None reported,,38000",
        "5,BMW,M3 Base,2008,115000,Gasoline,4.0L V8,A/T,Black,Black,None reported,Yes,19900",
        "6,Honda,Civic EX,2017,60000,Gasoline,2.0L I4,CVT,Gray,Black,None reported,Yes,16400",
        "7,Chevrolet,Tahoe LT,2014,130000,E85 Flex Fuel,5.3L V8,A/T,White,Beige,At least 1 accident or damage reported,,15500",
    ];
    format!("{HEADER},price\n{}\n", rows.join("\n"))
}

fn evaluation_text() -> String {
    let rows = [
        "30,Ford,Mustang GT,2018,41000,Gasoline,5.0L V8,6-Speed M/T,Blue,Black,None reported,Yes",
        "10,Lamborghini,Huracan,2021,3000,Gasoline,5.2L V10,A/T,Green,Black,,Yes",
        "20,Toyota,Prius,2016,87000,,1.8L I4,CVT,White,Gray,None reported,",
    ];
    format!("{HEADER}\n{}\n", rows.join("\n"))
}

#[test]
fn single_training_row_prices_evaluation_row() {
    let dir = TempDir::new().unwrap();
    let train = format!("{HEADER},price\n1,Ford,Focus SE,2014,90000,Gasoline,2.0L I4,A/T,Blue,Black,None,Yes,7300\n");
    let eval = format!("{HEADER}\n2,Ford,Focus SE,2015,85000,None,2.0L I4,A/T,Blue,Black,None reported,Yes\n");
    let config = config_for(dir.path(), &train, &eval);
    let output = config.paths.output.clone();

    let summary = PricingPipeline::new(config).unwrap().run().unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text, "id,price\n2,7300\n");
    assert_eq!(summary.training_rows, 1);
    assert_eq!(summary.evaluation_rows, 1);
    assert_eq!(summary.output_digest, digest_hex(text.as_bytes()));
    // "Gasoline" and the "Unknown" sentinel from the evaluation table
    assert_eq!(summary.cardinalities["fuel_type"], 2);
    assert_eq!(summary.cardinalities["accident"], 1);
}

#[test]
fn output_keeps_evaluation_order_and_prices_unseen_brands() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), &training_text(), &evaluation_text());
    let output = config.paths.output.clone();

    let summary = PricingPipeline::new(config).unwrap().run().unwrap();
    assert!(summary.cardinalities["brand"] >= 7);

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,price"));

    let rows: Vec<(String, i64)> = lines
        .map(|line| {
            let (id, price) = line.split_once(',').unwrap();
            (id.to_string(), price.parse().unwrap())
        })
        .collect();
    let ids: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["30", "10", "20"]);

    for (_, price) in &rows {
        assert!((8900..=38000).contains(price), "{price}");
    }
}

#[test]
fn repeated_runs_write_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), &training_text(), &evaluation_text());

    let first = PricingPipeline::new(config.clone()).unwrap().run().unwrap();
    let first_bytes = fs::read(&first.output_path).unwrap();

    config.paths.output = dir.path().join("again.csv");
    let second = PricingPipeline::new(config).unwrap().run().unwrap();
    let second_bytes = fs::read(&second.output_path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.output_digest, second.output_digest);
}

#[test]
fn empty_training_table_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), &format!("{HEADER},price\n"), &evaluation_text());
    let output = config.paths.output.clone();

    let err = PricingPipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::Training(_)), "{err:?}");
    assert_eq!(err.stage(), "train");
    assert!(!output.exists());
}

#[test]
fn missing_column_is_a_schema_error() {
    let dir = TempDir::new().unwrap();
    let train = training_text().replacen(",milage,", ",mileage,", 1);
    let config = config_for(dir.path(), &train, &evaluation_text());
    let output = config.paths.output.clone();

    match PricingPipeline::new(config).unwrap().run() {
        Err(PipelineError::Schema { table, column }) => {
            assert_eq!(table, TableKind::Training);
            assert_eq!(column, "milage");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn unparseable_mileage_is_rejected() {
    let dir = TempDir::new().unwrap();
    let eval = evaluation_text().replace(",41000,", ",41k,");
    let config = config_for(dir.path(), &training_text(), &eval);

    match PricingPipeline::new(config).unwrap().run() {
        Err(PipelineError::InvalidValue { table, row, column, .. }) => {
            assert_eq!(table, TableKind::Evaluation);
            assert_eq!(row, 1);
            assert_eq!(column, "milage");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn missing_input_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), &training_text(), &evaluation_text());
    config.paths.train = dir.path().join("absent.csv");

    let err = PricingPipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }), "{err:?}");
    assert_eq!(err.stage(), "io");
}

#[test]
fn evaluate_writes_metric_and_prediction_tables() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), &training_text(), &evaluation_text());
    let metrics_path = config.evaluation.metrics_path.clone();
    let predictions_path = config.evaluation.predictions_path.clone();

    let summary = PricingPipeline::new(config).unwrap().evaluate().unwrap();
    assert_eq!(summary.holdout_rows, 2);
    assert_eq!(summary.fit_rows, 6);

    let metrics = fs::read_to_string(&metrics_path).unwrap();
    let lines: Vec<&str> = metrics.lines().collect();
    assert_eq!(lines[0], ",MAE,RMSE,R2");
    assert!(lines[1].starts_with("RandomForest,"));
    assert!(lines[2].starts_with("DecisionTree,"));

    let predictions = fs::read_to_string(&predictions_path).unwrap();
    assert!(predictions.starts_with("id,actual,RandomForest,DecisionTree\n"));
    assert_eq!(predictions.lines().count(), 3);
}

#[test]
fn config_file_drives_the_run() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), &training_text(), &evaluation_text());
    let config_path = write(dir.path(), "autoprice.toml", &config.to_toml_string().unwrap());

    let loaded = PipelineConfig::load_from_file(&config_path).unwrap();
    assert_eq!(loaded, config);

    let summary = PricingPipeline::new(loaded).unwrap().run().unwrap();
    assert_eq!(summary.output_path, dir.path().join("test_predictions.csv"));
}

#[test]
fn failed_evaluation_leaves_no_report_files() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), &training_text(), &evaluation_text());
    config.evaluation.predictions_path = dir.path().join("missing").join("model_predictions.csv");
    let metrics_path = config.evaluation.metrics_path.clone();

    let err = PricingPipeline::new(config).unwrap().evaluate().unwrap_err();

    assert!(matches!(err, PipelineError::Io { .. }), "{err:?}");
    assert!(!metrics_path.exists());
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["test.csv", "train.csv"]);
}
