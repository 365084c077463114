//! Command-line argument definitions using clap

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{
    parse_boundary, preop_cohorts, InputEncoding, IntraopConfig, PreopConfig, RunOptions,
    DEFAULT_GENERATED_FILE, DEFAULT_OUTCOMES_FILE, DEFAULT_STUDY_START,
    DEFAULT_TEST_END, DEFAULT_TEST_START, INTRAOP_COHORTS, INTRAOP_FILENAMES,
    INTRAOP_OUTCOME_COLUMN,
};

/// cohortstats - Descriptive statistics reports for preop and intraop cohorts
#[derive(Parser, Debug)]
#[command(name = "cohortstats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize preop variables for each cohort, complication and outcome subset
    Preop(PreopArgs),

    /// Summarize intraop files for each outcome, cohort and outcome subset
    Intraop(IntraopArgs),
}

/// Options shared by both subcommands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory holding the `preop/` and `intraop/` input folders
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Root directory of the report tree
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan (slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Worker threads for report combinations (1 = sequential, 0 = all cores)
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Hide progress bars
    #[arg(long, default_value = "false")]
    pub no_progress: bool,
}

impl CommonArgs {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            threads: self.jobs,
            show_progress: !self.no_progress,
        }
    }

    fn schema_length(&self) -> Option<usize> {
        if self.infer_schema_length == 0 {
            None
        } else {
            Some(self.infer_schema_length)
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PreopArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Feature dictionary (`feature_name`, `feature_type` columns).
    /// Defaults to `<input-dir>/Idealist_feature_list.csv`.
    #[arg(short, long)]
    pub dictionary: Option<PathBuf>,

    /// Generated-variables file inside `<input-dir>/preop`
    #[arg(long, default_value = DEFAULT_GENERATED_FILE)]
    pub generated_file: PathBuf,

    /// Outcomes file inside `<input-dir>/preop`
    #[arg(long, default_value = DEFAULT_OUTCOMES_FILE)]
    pub outcomes_file: PathBuf,

    /// Encoding of the generated-variables file (latin1 or utf8)
    #[arg(long, default_value = "latin1")]
    pub encoding: InputEncoding,

    /// Exclusive lower bound of the training cohort
    #[arg(long, default_value = DEFAULT_STUDY_START, value_parser = parse_boundary)]
    pub study_start: NaiveDateTime,

    /// First timestamp of the test cohort; exclusive upper bound of training
    #[arg(long, default_value = DEFAULT_TEST_START, value_parser = parse_boundary)]
    pub test_start: NaiveDateTime,

    /// Last timestamp of the test cohort (inclusive)
    #[arg(long, default_value = DEFAULT_TEST_END, value_parser = parse_boundary)]
    pub test_end: NaiveDateTime,
}

impl PreopArgs {
    /// Resolve the arguments into a run configuration.
    pub fn to_config(&self) -> Result<PreopConfig, String> {
        validate_window_order(self.study_start, self.test_start, self.test_end)?;

        let mut config = PreopConfig::new(&self.common.input_dir, &self.common.output_dir);
        if let Some(dictionary) = &self.dictionary {
            config.dictionary_path = dictionary.clone();
        }
        config.generated_file = self.generated_file.clone();
        config.outcomes_file = self.outcomes_file.clone();
        config.generated_encoding = self.encoding;
        config.infer_schema_length = self.common.schema_length();
        config.cohorts = preop_cohorts(self.study_start, self.test_start, self.test_end);
        config.run = self.common.run_options();
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct IntraopArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Intraop file stems (comma-separated)
    #[arg(long, value_delimiter = ',', default_values = INTRAOP_FILENAMES)]
    pub filenames: Vec<String>,

    /// Intraop cohorts (comma-separated)
    #[arg(long, value_delimiter = ',', default_values = INTRAOP_COHORTS)]
    pub cohorts: Vec<String>,

    /// Outcome label column of every intraop file
    #[arg(long, default_value = INTRAOP_OUTCOME_COLUMN)]
    pub outcome_column: String,
}

impl IntraopArgs {
    pub fn to_config(&self) -> IntraopConfig {
        let mut config = IntraopConfig::new(&self.common.input_dir, &self.common.output_dir);
        config.filenames = self.filenames.clone();
        config.cohorts = self.cohorts.clone();
        config.outcome_column = self.outcome_column.clone();
        config.infer_schema_length = self.common.schema_length();
        config.run = self.common.run_options();
        config
    }
}

/// Log filter implied by the verbosity count
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Cohort boundaries must be strictly increasing
fn validate_window_order(
    study_start: NaiveDateTime,
    test_start: NaiveDateTime,
    test_end: NaiveDateTime,
) -> Result<(), String> {
    if study_start >= test_start {
        Err(format!(
            "study start ({}) must be before test start ({})",
            study_start, test_start
        ))
    } else if test_start > test_end {
        Err(format!(
            "test start ({}) must not be after test end ({})",
            test_start, test_end
        ))
    } else {
        Ok(())
    }
}
