//! Drives summaries across cohorts, outcomes, subsets and variable types
//!
//! Each report combination is a [`Job`]. Jobs are independent: a failure is
//! logged, recorded as a [`SkippedCombination`] and the remaining jobs still
//! run. Jobs may run on a rayon pool since no two of them write the same file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::categorical::summarize_categorical;
use super::cohort::{filter_outcome, split_cohort, OutcomeSubset};
use super::config::{IntraopConfig, PreopConfig, RunOptions};
use super::dictionary::{FeatureDictionary, VariableType};
use super::error::{ErrorKind, SummaryResult};
use super::loader::{
    load_generated_variables, load_intraop_cohort, load_outcomes, merge_outcomes,
    ANESTHESIA_START_COLUMN, ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN,
};
use super::numeric::summarize_numeric;
use crate::report::{write_categorical_report, write_numeric_report, AnalysisPhase, ReportLocation};
use crate::utils::{create_report_bar, create_spinner, finish_with_success, finish_with_warning};

/// Variable types in the order reports are produced for each subset
const PREOP_REPORT_ORDER: [VariableType; 3] = [
    VariableType::Categorical,
    VariableType::Binary,
    VariableType::Numerical,
];

/// One report combination
#[derive(Debug, Clone)]
pub struct Job {
    pub location: ReportLocation,
    /// Cohort table the job filters from
    pub table: Arc<DataFrame>,
    /// Label column used for the outcome subset
    pub outcome_column: String,
    /// Requested variables of `location.variable_type`
    pub variables: Arc<Vec<String>>,
}

/// A combination whose report was not written
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCombination {
    pub combination: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedCombination>,
    /// Requested variables absent from the input tables
    pub missing_columns: BTreeSet<String>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len()
    }

    /// Fold another batch into this one
    pub fn merge(&mut self, other: RunReport) {
        self.written.extend(other.written);
        self.skipped.extend(other.skipped);
        self.missing_columns.extend(other.missing_columns);
    }

    fn record_missing(&mut self, columns: Vec<String>) {
        for column in columns {
            if self.missing_columns.insert(column.clone()) {
                log::warn!("requested column '{}' is not present in the input", column);
            }
        }
    }
}

/// Result of one successful job
#[derive(Debug)]
struct Written {
    path: PathBuf,
    missing_columns: Vec<String>,
}

/// Filter, summarize and write a single combination.
fn run_job(job: &Job, output_root: &Path) -> SummaryResult<Written> {
    let subset = filter_outcome(&job.table, &job.outcome_column, job.location.subset)?;

    match job.location.variable_type {
        VariableType::Numerical => {
            let report = summarize_numeric(&subset, &job.variables)?;
            let path = write_numeric_report(&report, output_root, &job.location)?;
            Ok(Written {
                path,
                missing_columns: report.missing_columns,
            })
        }
        VariableType::Categorical | VariableType::Binary => {
            let report = summarize_categorical(&subset, &job.variables)?;
            let path = write_categorical_report(&report, output_root, &job.location)?;
            Ok(Written {
                path,
                missing_columns: report.missing_columns,
            })
        }
    }
}

/// Run every job, recording failures instead of stopping at the first one.
pub fn run_jobs(jobs: &[Job], output_root: &Path, options: &RunOptions) -> RunReport {
    let progress = create_report_bar(jobs.len() as u64, options.show_progress);

    let execute = |job: &Job| {
        let result = run_job(job, output_root);
        progress.inc(1);
        result
    };

    let results: Vec<SummaryResult<Written>> = if options.threads == 1 {
        jobs.iter().map(execute).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(options.threads).build() {
            Ok(pool) => pool.install(|| jobs.par_iter().map(execute).collect()),
            Err(e) => {
                log::warn!("could not start worker pool ({}); running sequentially", e);
                jobs.iter().map(execute).collect()
            }
        }
    };
    progress.finish_and_clear();

    let mut report = RunReport::default();
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(written) => {
                log::debug!("wrote {}", written.path.display());
                report.record_missing(written.missing_columns);
                report.written.push(written.path);
            }
            Err(e) => {
                log::warn!("skipping {}: {}", job.location, e);
                report.skipped.push(SkippedCombination {
                    combination: job.location.id(),
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// Preop jobs: cohort × complication × subset × variable type.
pub fn plan_preop(
    cohorts: &[(String, Arc<DataFrame>)],
    complications: &[String],
    dictionary: &FeatureDictionary,
) -> Vec<Job> {
    let variables: Vec<(VariableType, Arc<Vec<String>>)> = PREOP_REPORT_ORDER
        .iter()
        .map(|kind| (*kind, Arc::new(dictionary.variables(*kind).to_vec())))
        .collect();

    let mut jobs = Vec::new();
    for (cohort, table) in cohorts {
        for complication in complications {
            for subset in OutcomeSubset::REPORTED {
                for (kind, vars) in &variables {
                    jobs.push(Job {
                        location: ReportLocation {
                            phase: AnalysisPhase::Preop,
                            variable_type: *kind,
                            cohort: cohort.clone(),
                            group: complication.clone(),
                            subset,
                        },
                        table: Arc::clone(table),
                        outcome_column: complication.clone(),
                        variables: Arc::clone(vars),
                    });
                }
            }
        }
    }
    jobs
}

/// Intraop jobs for one loaded file: numeric reports for every subset.
///
/// Every column of the table is summarized, the outcome label included.
pub fn plan_intraop(filename: &str, cohort: &str, table: Arc<DataFrame>, outcome_column: &str) -> Vec<Job> {
    let variables: Arc<Vec<String>> = Arc::new(
        table
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect(),
    );

    OutcomeSubset::REPORTED
        .iter()
        .map(|subset| Job {
            location: intraop_location(filename, cohort, *subset),
            table: Arc::clone(&table),
            outcome_column: outcome_column.to_string(),
            variables: Arc::clone(&variables),
        })
        .collect()
}

fn intraop_location(filename: &str, cohort: &str, subset: OutcomeSubset) -> ReportLocation {
    ReportLocation {
        phase: AnalysisPhase::Intraop,
        variable_type: VariableType::Numerical,
        cohort: cohort.to_string(),
        group: filename.to_string(),
        subset,
    }
}

/// Preop batch: load, merge outcomes, split cohorts and write every report.
pub fn run_preop_analysis(config: &PreopConfig) -> Result<RunReport> {
    let spinner = config
        .run
        .show_progress
        .then(|| create_spinner("Loading preop inputs..."));

    let dictionary = FeatureDictionary::load(&config.dictionary_path)?;

    let features = load_generated_variables(&config.generated_path(), &config.generated_csv_options())?;
    let outcomes = load_outcomes(&config.outcomes_path(), &config.outcome_map)?;
    let merged = merge_outcomes(
        features,
        outcomes,
        &[ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN],
    )?;

    let mut cohorts = Vec::with_capacity(config.cohorts.len());
    for window in &config.cohorts {
        let table = split_cohort(&merged, ANESTHESIA_START_COLUMN, window)
            .with_context(|| format!("Failed to build cohort '{}'", window.name))?;
        cohorts.push((window.name.clone(), Arc::new(table)));
    }

    if let Some(spinner) = &spinner {
        finish_with_success(spinner, "Preop inputs loaded");
    }

    let jobs = plan_preop(&cohorts, &config.complications(), &dictionary);
    log::info!("preop: {} report combination(s) planned", jobs.len());

    Ok(run_jobs(&jobs, &config.output_dir, &config.run))
}

/// Intraop batch: one numeric report per file, cohort and subset.
///
/// A file that cannot be loaded skips its combinations; the other files still
/// run.
pub fn run_intraop_analysis(config: &IntraopConfig) -> Result<RunReport> {
    let spinner = config
        .run
        .show_progress
        .then(|| create_spinner("Loading intraop files..."));
    let mut jobs = Vec::new();
    let mut load_failures = Vec::new();

    for filename in &config.filenames {
        for cohort in &config.cohorts {
            let path = config.cohort_path(filename, cohort);
            match load_intraop_cohort(&path, &config.csv_options()) {
                Ok(table) => {
                    jobs.extend(plan_intraop(filename, cohort, Arc::new(table), &config.outcome_column));
                }
                Err(e) => {
                    log::warn!("skipping intraop file {}: {:#}", path.display(), e);
                    for subset in OutcomeSubset::REPORTED {
                        load_failures.push(SkippedCombination {
                            combination: intraop_location(filename, cohort, subset).id(),
                            kind: ErrorKind::Load,
                            message: format!("{:#}", e),
                        });
                    }
                }
            }
        }
    }

    if let Some(spinner) = &spinner {
        if load_failures.is_empty() {
            finish_with_success(spinner, "Intraop files loaded");
        } else {
            finish_with_warning(spinner, "Some intraop files could not be loaded");
        }
    }

    log::info!("intraop: {} report combination(s) planned", jobs.len());
    let mut report = run_jobs(&jobs, &config.output_dir, &config.run);
    report.skipped.extend(load_failures);
    Ok(report)
}
