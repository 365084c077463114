//! Tests for input loading, outcome merging and cohort splitting

#[path = "common/mod.rs"]
mod common;

use cohortstats::pipeline::{
    default_outcome_map, default_preop_cohorts, get_column_names, load_csv,
    load_generated_variables, load_intraop_cohort, load_outcomes, merge_outcomes, split_cohort,
    CsvOptions, FeatureDictionary, InputEncoding, VariableType, ANESTHESIA_START_COLUMN,
    ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN,
};
use polars::prelude::*;
use tempfile::TempDir;

fn latin1() -> CsvOptions {
    CsvOptions::default().with_encoding(InputEncoding::Latin1)
}

#[test]
fn test_latin1_text_is_decoded() {
    let temp_dir = TempDir::new().unwrap();
    let path = common::write_file(
        temp_dir.path(),
        "names.csv",
        &common::latin1_bytes("id,service\n1,Orthopédie\n2,Réanimation\n"),
    );

    let df = load_csv(&path, &latin1()).unwrap();

    let services: Vec<Option<&str>> = df.column("service").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(services, vec![Some("Orthopédie"), Some("Réanimation")]);
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_csv(&temp_dir.path().join("absent.csv"), &CsvOptions::default());
    assert!(result.is_err(), "loading a missing file should fail");
}

#[test]
fn test_get_column_names() {
    let mut df = common::create_cohort_dataframe();
    let (_temp_dir, path) = common::create_temp_csv(&mut df);

    let columns = get_column_names(&path).unwrap();

    assert_eq!(columns, vec!["age", "lab", "sex", "smoker", "sepsispred"]);
}

#[test]
fn test_generated_variables_rename_and_parse() {
    let temp_dir = TempDir::new().unwrap();
    let (input, _) = common::create_preop_layout(&temp_dir);

    let df = load_generated_variables(&input.join("preop").join("All_generated_variables.csv"), &latin1()).unwrap();

    assert!(df.column(SCHEDULED_START_COLUMN).is_ok(), "legacy column should be renamed");
    assert!(df.column("sched_start_time").is_err());
    assert!(matches!(
        df.column(ANESTHESIA_START_COLUMN).unwrap().dtype(),
        DataType::Datetime(_, _)
    ));
    assert_eq!(df.height(), 12);
}

#[test]
fn test_outcomes_are_selected_and_renamed() {
    let temp_dir = TempDir::new().unwrap();
    let (input, _) = common::create_preop_layout(&temp_dir);

    let df = load_outcomes(
        &input.join("preop").join("outcome_final_modified_0905.csv"),
        &default_outcome_map(),
    )
    .unwrap();

    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(
        columns,
        vec![
            ENCOUNTER_ID_COLUMN,
            SCHEDULED_START_COLUMN,
            "sepsispred",
            "mvcomppred",
            "neurodelpred",
            "icucomppred"
        ]
    );
}

#[test]
fn test_merge_keeps_unmatched_feature_rows() {
    let features = df! {
        "encounter_deiden_id" => [1i64, 2, 3],
        "sched_start_datetime" => ["2015-01-01 07:00:00", "2015-01-02 07:00:00", "2015-01-03 07:00:00"],
        "age" => [40i64, 50, 60],
    }
    .unwrap();
    let outcomes = df! {
        "encounter_deiden_id" => ["1", "3"],
        "sched_start_datetime" => ["2015-01-01 07:00:00", "2015-01-03 07:00:00"],
        "sepsispred" => [1i64, 0],
    }
    .unwrap();

    let merged = merge_outcomes(features, outcomes, &[ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN]).unwrap();

    assert_eq!(merged.height(), 3);
    let labels: Vec<Option<i64>> = merged.column("sepsispred").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(labels, vec![Some(1), None, Some(0)]);
}

#[test]
fn test_default_cohorts_split_fixture() {
    let temp_dir = TempDir::new().unwrap();
    let (input, _) = common::create_preop_layout(&temp_dir);
    let features = load_generated_variables(&input.join("preop").join("All_generated_variables.csv"), &latin1()).unwrap();
    let outcomes = load_outcomes(
        &input.join("preop").join("outcome_final_modified_0905.csv"),
        &default_outcome_map(),
    )
    .unwrap();
    let merged = merge_outcomes(features, outcomes, &[ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN]).unwrap();

    let cohorts = default_preop_cohorts();
    let train = split_cohort(&merged, ANESTHESIA_START_COLUMN, &cohorts[0]).unwrap();
    let test = split_cohort(&merged, ANESTHESIA_START_COLUMN, &cohorts[1]).unwrap();

    // encounter 1 appears twice; encounter 11 predates the study window
    assert_eq!(train.height(), 6);
    assert_eq!(test.height(), 4, "both test boundaries are inclusive");
}

#[test]
fn test_intraop_keeps_numeric_columns_only() {
    let temp_dir = TempDir::new().unwrap();
    let (input, _) = common::create_intraop_layout(&temp_dir);

    let df = load_intraop_cohort(
        &input.join("intraop").join("IntraOp_full_sepsis_test_cohort.csv"),
        &CsvOptions::default(),
    )
    .unwrap();

    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(columns, vec!["duration", "blood_loss", "outcome"]);
}

#[test]
fn test_dictionary_fixture() {
    let temp_dir = TempDir::new().unwrap();
    let (input, _) = common::create_preop_layout(&temp_dir);

    let dictionary = FeatureDictionary::load(&input.join("Idealist_feature_list.csv")).unwrap();

    assert_eq!(dictionary.variables(VariableType::Numerical), ["age", "bmi"]);
    assert_eq!(dictionary.variables(VariableType::Categorical), ["service", "asa"]);
    assert_eq!(dictionary.variables(VariableType::Binary), ["smoker"]);
}
