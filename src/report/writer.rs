//! CSV report writer for numeric and categorical summaries
//!
//! Reports land at
//! `<root>/<phase>/<variable type>/<cohort>/<group>/Analyzed_data_<subset>.csv`.
//! Paths are assembled component by component, never by string concatenation.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    CategoricalReport, NumericReport, NumericSummary, OutcomeSubset, SummaryError, SummaryResult,
    VariableType,
};

/// File name prefix shared by all reports
pub const REPORT_FILE_PREFIX: &str = "Analyzed_data_";

/// Header of numeric reports, in column order
pub const NUMERIC_REPORT_COLUMNS: [&str; 8] = [
    "Variable",
    "25th Percentile",
    "Median",
    "75th Percentile",
    "Minimum",
    "Maximum",
    "mean",
    "SD",
];

/// Header of categorical and binary reports, in column order
pub const CATEGORICAL_REPORT_COLUMNS: [&str; 4] = ["Variable", "Categories", "Number", "Percentage"];

/// Which batch a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnalysisPhase {
    Preop,
    Intraop,
}

impl AnalysisPhase {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AnalysisPhase::Preop => "preop",
            AnalysisPhase::Intraop => "intraop",
        }
    }
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Identifies one report file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReportLocation {
    pub phase: AnalysisPhase,
    pub variable_type: VariableType,
    /// Cohort name, e.g. `train`
    pub cohort: String,
    /// Complication label or intraop file stem, e.g. `sepsispred`
    pub group: String,
    pub subset: OutcomeSubset,
}

impl ReportLocation {
    pub fn file_name(&self) -> String {
        format!("{}{}.csv", REPORT_FILE_PREFIX, self.subset.suffix())
    }

    /// Directory holding the report, relative to the output root
    pub fn relative_dir(&self) -> PathBuf {
        [
            self.phase.dir_name(),
            self.variable_type.dir_name(),
            self.cohort.as_str(),
            self.group.as_str(),
        ]
        .iter()
        .collect()
    }

    /// Full path of the report under `root`
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.relative_dir()).join(self.file_name())
    }

    /// Platform-independent identifier, e.g. `preop/numerical/train/sepsispred/Analyzed_data_all`
    pub fn id(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}{}",
            self.phase.dir_name(),
            self.variable_type.dir_name(),
            self.cohort,
            self.group,
            REPORT_FILE_PREFIX,
            self.subset.suffix()
        )
    }
}

impl std::fmt::Display for ReportLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Build the numeric report table
pub fn numeric_frame(report: &NumericReport) -> SummaryResult<DataFrame> {
    let rows = &report.rows;
    let columns = vec![
        Column::new(
            NUMERIC_REPORT_COLUMNS[0].into(),
            rows.iter().map(|r| r.variable.clone()).collect::<Vec<String>>(),
        ),
        float_column(NUMERIC_REPORT_COLUMNS[1], rows, |r| r.p25),
        float_column(NUMERIC_REPORT_COLUMNS[2], rows, |r| r.median),
        float_column(NUMERIC_REPORT_COLUMNS[3], rows, |r| r.p75),
        float_column(NUMERIC_REPORT_COLUMNS[4], rows, |r| r.min),
        float_column(NUMERIC_REPORT_COLUMNS[5], rows, |r| r.max),
        float_column(NUMERIC_REPORT_COLUMNS[6], rows, |r| r.mean),
        float_column(NUMERIC_REPORT_COLUMNS[7], rows, |r| r.sd),
    ];

    Ok(DataFrame::new(columns)?)
}

fn float_column(name: &str, rows: &[NumericSummary], value: impl Fn(&NumericSummary) -> f64) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<f64>>())
}

/// Build the categorical report table
pub fn categorical_frame(report: &CategoricalReport) -> SummaryResult<DataFrame> {
    let rows = &report.rows;
    let columns = vec![
        Column::new(
            CATEGORICAL_REPORT_COLUMNS[0].into(),
            rows.iter().map(|r| r.variable.clone()).collect::<Vec<String>>(),
        ),
        Column::new(
            CATEGORICAL_REPORT_COLUMNS[1].into(),
            rows.iter().map(|r| r.category.clone()).collect::<Vec<String>>(),
        ),
        Column::new(
            CATEGORICAL_REPORT_COLUMNS[2].into(),
            rows.iter().map(|r| r.count as u64).collect::<Vec<u64>>(),
        ),
        Column::new(
            CATEGORICAL_REPORT_COLUMNS[3].into(),
            rows.iter().map(|r| r.percentage_label()).collect::<Vec<String>>(),
        ),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Write a report table as CSV (header row, no index column), creating any
/// missing parent directories. Overwrites an existing file.
pub fn write_report(df: &mut DataFrame, path: &Path) -> SummaryResult<()> {
    if let Some(dir) = path.parent() {
        // create_dir_all tolerates directories created concurrently by other jobs
        std::fs::create_dir_all(dir).map_err(|e| SummaryError::write(dir, e))?;
    }

    let mut file = File::create(path).map_err(|e| SummaryError::write(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| SummaryError::write(path, e))?;

    Ok(())
}

/// Write a numeric report to its location under `root`
pub fn write_numeric_report(
    report: &NumericReport,
    root: &Path,
    location: &ReportLocation,
) -> SummaryResult<PathBuf> {
    let path = location.path_under(root);
    let mut df = numeric_frame(report)?;
    write_report(&mut df, &path)?;
    Ok(path)
}

/// Write a categorical or binary report to its location under `root`
pub fn write_categorical_report(
    report: &CategoricalReport,
    root: &Path,
    location: &ReportLocation,
) -> SummaryResult<PathBuf> {
    let path = location.path_under(root);
    let mut df = categorical_frame(report)?;
    write_report(&mut df, &path)?;
    Ok(path)
}
