//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Small cohort table with one column of each kind
///
/// - `age`: clean numeric
/// - `lab`: numeric stored as text with one unparseable cell and one blank
/// - `sex`: categorical text
/// - `smoker`: binary 0/1
/// - `sepsispred`: outcome label (3 zeros, 3 ones)
pub fn create_cohort_dataframe() -> DataFrame {
    df! {
        "age" => [45.0f64, 52.0, 61.0, 70.0, 38.0, 66.0],
        "lab" => [Some("1.5"), Some("n/a"), Some("2.5"), Some(""), Some("3.5"), None],
        "sex" => ["F", "M", "F", "F", "M", "F"],
        "smoker" => [0i32, 1, 0, 0, 1, 0],
        "sepsispred" => [0i32, 1, 0, 1, 0, 1],
    }
    .unwrap()
}

/// Random numeric table for property checks and benchmarks
pub fn create_random_numeric_dataframe(rows: usize, cols: usize) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let mut columns: Vec<Column> = Vec::with_capacity(cols + 1);
    let label: Vec<i32> = (0..rows).map(|_| rng.gen_range(0..2)).collect();
    columns.push(Column::new("outcome".into(), label));

    for i in 0..cols {
        let values: Vec<Option<f64>> = (0..rows)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(rng.gen_range(-1000.0..1000.0))
                }
            })
            .collect();
        columns.push(Column::new(format!("var_{}", i).into(), values));
    }

    DataFrame::new(columns).unwrap()
}

/// Random categorical column with `levels` distinct labels and some nulls
pub fn create_random_categorical_dataframe(rows: usize, levels: usize) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let values: Vec<Option<String>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.15) {
                None
            } else {
                Some(format!("level_{}", rng.gen_range(0..levels)))
            }
        })
        .collect();

    DataFrame::new(vec![Column::new("category".into(), values)]).unwrap()
}

/// Save a DataFrame as CSV in a temp directory
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&file_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, file_path)
}

/// Write raw bytes to `dir/relative`, creating parent directories
pub fn write_file(dir: &Path, relative: &str, contents: &[u8]) -> PathBuf {
    let path = relative.split('/').fold(dir.to_path_buf(), |p, part| p.join(part));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Encode text as ISO-8859-1; panics on characters outside Latin-1
pub fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).expect("character outside Latin-1"))
        .collect()
}

pub const DICTIONARY_CSV: &str = "\
feature_name,feature_type
age,num
bmi,num
service,cat
asa,cat
smoker,bin
";

/// Generated variables: six training encounters (plus one exact duplicate),
/// four test encounters and one encounter before the study window.
pub const GENERATED_CSV: &str = "\
encounter_deiden_id,sched_start_time,anesthesia_start_datetime,age,service,asa,smoker
1,2015-01-05 07:00:00,2015-01-05 07:30:00,45,Orthopédie,2,0
2,2015-03-10 08:00:00,2015-03-10 08:20:00,52,Cardiologie,3,1
3,2016-07-21 09:00:00,2016-07-21 09:10:00,61,Orthopédie,2,0
4,2017-02-14 10:00:00,2017-02-14 10:45:00,70,Cardiologie,4,1
5,2017-09-01 11:00:00,2017-09-01 11:05:00,38,Orthopédie,1,0
6,2018-02-28 12:00:00,2018-02-28 23:59:59,66,Cardiologie,3,0
1,2015-01-05 07:00:00,2015-01-05 07:30:00,45,Orthopédie,2,0
7,2018-03-01 00:00:00,2018-03-01 00:00:00,57,Orthopédie,2,1
8,2018-06-15 07:00:00,2018-06-15 07:40:00,49,Cardiologie,3,0
9,2018-11-30 08:00:00,2018-11-30 08:15:00,73,Orthopédie,4,1
10,2019-03-02 00:00:00,2019-03-02 00:00:00,64,Cardiologie,2,0
11,2013-12-01 07:00:00,2013-12-01 07:30:00,50,Orthopédie,2,0
";

pub const OUTCOMES_CSV: &str = "\
encounter_deiden_id,sched_start_datetime,sepsis,ICU_gt_2d,mv_greater_2days,neuro_delirium_comb,unused
1,2015-01-05 07:00:00,0,0,0,0,x
2,2015-03-10 08:00:00,1,1,1,1,x
3,2016-07-21 09:00:00,0,0,0,0,x
4,2017-02-14 10:00:00,1,1,1,1,x
5,2017-09-01 11:00:00,0,0,0,0,x
6,2018-02-28 12:00:00,1,1,1,1,x
7,2018-03-01 00:00:00,0,0,0,0,x
8,2018-06-15 07:00:00,1,1,1,1,x
9,2018-11-30 08:00:00,0,0,0,0,x
10,2019-03-02 00:00:00,1,1,1,1,x
11,2013-12-01 07:00:00,1,1,1,1,x
";

/// Lay out a complete preop input directory; returns (input dir, output dir).
pub fn create_preop_layout(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let input = temp_dir.path().join("input");
    write_file(&input, "Idealist_feature_list.csv", DICTIONARY_CSV.as_bytes());
    write_file(&input, "preop/All_generated_variables.csv", &latin1_bytes(GENERATED_CSV));
    write_file(&input, "preop/outcome_final_modified_0905.csv", OUTCOMES_CSV.as_bytes());
    (input, temp_dir.path().join("output"))
}

pub const INTRAOP_CSV: &str = "\
patient_deiden_id,duration,blood_loss,site,outcome
101,120.5,300,OR1,0
102,95.0,150,OR2,1
103,210.0,800,OR1,0
104,60.0,,OR3,1
105,150.0,450,OR2,1
";

/// Intraop input with only the `sepsis` files present; returns (input dir, output dir).
pub fn create_intraop_layout(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let input = temp_dir.path().join("input");
    for cohort in ["development", "test"] {
        write_file(
            &input,
            &format!("intraop/IntraOp_full_sepsis_{}_cohort.csv", cohort),
            INTRAOP_CSV.as_bytes(),
        );
    }
    (input, temp_dir.path().join("output"))
}

/// Read a written report back for assertions
pub fn read_report(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .unwrap()
        .finish()
        .unwrap()
}
