//! Run configuration for the preop and intraop batches
//!
//! Every path, cohort boundary and variable list is passed explicitly; the
//! defaults reproduce the study layout the reports were designed for.

use std::ops::Bound;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::cohort::CohortWindow;
use super::loader::{CsvOptions, InputEncoding, DEFAULT_OUTCOME_MAP};

pub const DEFAULT_DICTIONARY_FILE: &str = "Idealist_feature_list.csv";
pub const DEFAULT_GENERATED_FILE: &str = "All_generated_variables.csv";
pub const DEFAULT_OUTCOMES_FILE: &str = "outcome_final_modified_0905.csv";

/// Intraop file stems, one per outcome
pub const INTRAOP_FILENAMES: [&str; 4] = ["ICU_duration", "MV_duration", "sepsis", "neuro_delirium_comb"];
/// Intraop cohorts
pub const INTRAOP_COHORTS: [&str; 2] = ["development", "test"];
/// Label column of every intraop file
pub const INTRAOP_OUTCOME_COLUMN: &str = "outcome";

/// Default boundary between nothing and the training cohort (exclusive)
pub const DEFAULT_STUDY_START: &str = "2014-06-01 00:00:00";
/// Default boundary between training and test cohorts
pub const DEFAULT_TEST_START: &str = "2018-03-01 00:00:00";
/// Default last timestamp of the test cohort (inclusive)
pub const DEFAULT_TEST_END: &str = "2019-03-02 00:00:00";

// Dates behind the boundary strings above, all at midnight. Evaluated at
// compile time, so an invalid date fails the build.
const DEFAULT_STUDY_START_DATE: NaiveDate = const_date(2014, 6, 1);
const DEFAULT_TEST_START_DATE: NaiveDate = const_date(2018, 3, 1);
const DEFAULT_TEST_END_DATE: NaiveDate = const_date(2019, 3, 2);

const fn const_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid default cohort date"),
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Settings shared by both batches
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Worker threads for report combinations; `1` runs sequentially, `0`
    /// uses one thread per core
    pub threads: usize,
    /// Draw a progress bar while combinations run
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            show_progress: false,
        }
    }
}

/// Configuration of the preop batch
#[derive(Debug, Clone)]
pub struct PreopConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dictionary_path: PathBuf,
    /// Generated-variables file, relative to `<input_dir>/preop`
    pub generated_file: PathBuf,
    /// Outcomes file, relative to `<input_dir>/preop`
    pub outcomes_file: PathBuf,
    pub generated_encoding: InputEncoding,
    pub infer_schema_length: Option<usize>,
    pub cohorts: Vec<CohortWindow>,
    /// `(source column, report label)` per outcome, in report order
    pub outcome_map: Vec<(String, String)>,
    pub run: RunOptions,
}

impl PreopConfig {
    /// Configuration with the default study layout under `input_dir`
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        Self {
            dictionary_path: input_dir.join(DEFAULT_DICTIONARY_FILE),
            input_dir,
            output_dir: output_dir.into(),
            generated_file: PathBuf::from(DEFAULT_GENERATED_FILE),
            outcomes_file: PathBuf::from(DEFAULT_OUTCOMES_FILE),
            generated_encoding: InputEncoding::Latin1,
            infer_schema_length: Some(10_000),
            cohorts: default_preop_cohorts(),
            outcome_map: default_outcome_map(),
            run: RunOptions::default(),
        }
    }

    pub fn generated_path(&self) -> PathBuf {
        self.input_dir.join("preop").join(&self.generated_file)
    }

    pub fn outcomes_path(&self) -> PathBuf {
        self.input_dir.join("preop").join(&self.outcomes_file)
    }

    pub fn generated_csv_options(&self) -> CsvOptions {
        CsvOptions {
            encoding: self.generated_encoding,
            infer_schema_length: self.infer_schema_length,
        }
    }

    /// Outcome labels, i.e. the complication groups of the report tree
    pub fn complications(&self) -> Vec<String> {
        self.outcome_map.iter().map(|(_, label)| label.clone()).collect()
    }
}

/// Configuration of the intraop batch
#[derive(Debug, Clone)]
pub struct IntraopConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub filenames: Vec<String>,
    pub cohorts: Vec<String>,
    pub outcome_column: String,
    pub infer_schema_length: Option<usize>,
    pub run: RunOptions,
}

impl IntraopConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            filenames: INTRAOP_FILENAMES.iter().map(|s| s.to_string()).collect(),
            cohorts: INTRAOP_COHORTS.iter().map(|s| s.to_string()).collect(),
            outcome_column: INTRAOP_OUTCOME_COLUMN.to_string(),
            infer_schema_length: Some(10_000),
            run: RunOptions::default(),
        }
    }

    /// Path of the intraop file for one outcome and cohort
    pub fn cohort_path(&self, filename: &str, cohort: &str) -> PathBuf {
        self.input_dir
            .join("intraop")
            .join(format!("IntraOp_full_{}_{}_cohort.csv", filename, cohort))
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            encoding: InputEncoding::Utf8,
            infer_schema_length: self.infer_schema_length,
        }
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` boundary timestamp
pub fn parse_boundary(text: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| format!("'{}' is not a valid timestamp (expected YYYY-MM-DD HH:MM:SS): {}", text, e))
}

/// Train and test windows from explicit boundaries.
///
/// `train = (study_start, test_start)` and `test = [test_start, test_end]`.
pub fn preop_cohorts(
    study_start: NaiveDateTime,
    test_start: NaiveDateTime,
    test_end: NaiveDateTime,
) -> Vec<CohortWindow> {
    vec![
        CohortWindow::new("train", Bound::Excluded(study_start), Bound::Excluded(test_start)),
        CohortWindow::new("test", Bound::Included(test_start), Bound::Included(test_end)),
    ]
}

pub fn default_preop_cohorts() -> Vec<CohortWindow> {
    preop_cohorts(
        midnight(DEFAULT_STUDY_START_DATE),
        midnight(DEFAULT_TEST_START_DATE),
        midnight(DEFAULT_TEST_END_DATE),
    )
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// The default outcome map, ordered as complications are reported
pub fn default_outcome_map() -> Vec<(String, String)> {
    DEFAULT_OUTCOME_MAP
        .iter()
        .map(|(source, label)| (source.to_string(), label.to_string()))
        .collect()
}
