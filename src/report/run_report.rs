//! JSON export of a finished batch

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{RunReport, SkippedCombination};

/// File name of the export, written at the output root
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub cohortstats_version: String,
    /// `preop` or `intraop`
    pub phase: String,
    pub input_dir: String,
    pub output_dir: String,
}

#[derive(Serialize)]
pub struct RunCounts {
    pub planned: usize,
    pub written: usize,
    pub skipped: usize,
    pub missing_columns: usize,
}

/// Complete export
#[derive(Serialize)]
pub struct RunReportExport<'a> {
    pub metadata: RunMetadata,
    pub counts: RunCounts,
    /// Report files relative to the output root, `/`-separated
    pub written: Vec<String>,
    pub skipped: &'a [SkippedCombination],
    pub missing_columns: &'a BTreeSet<String>,
}

/// Parameters for the export metadata
pub struct ExportParams<'a> {
    pub phase: &'a str,
    pub input_dir: &'a Path,
    pub output_dir: &'a Path,
}

/// Write `run_report.json` under the output directory and return its path.
pub fn export_run_report(report: &RunReport, params: &ExportParams) -> Result<PathBuf> {
    let written = report
        .written
        .iter()
        .map(|path| relative_id(path, params.output_dir))
        .collect();

    let export = RunReportExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            cohortstats_version: env!("CARGO_PKG_VERSION").to_string(),
            phase: params.phase.to_string(),
            input_dir: params.input_dir.display().to_string(),
            output_dir: params.output_dir.display().to_string(),
        },
        counts: RunCounts {
            planned: report.total(),
            written: report.written.len(),
            skipped: report.skipped.len(),
            missing_columns: report.missing_columns.len(),
        },
        written,
        skipped: &report.skipped,
        missing_columns: &report.missing_columns,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize run report to JSON")?;

    std::fs::create_dir_all(params.output_dir)
        .with_context(|| format!("Failed to create {}", params.output_dir.display()))?;
    let output_path = params.output_dir.join(RUN_REPORT_FILE);
    std::fs::write(&output_path, json)
        .with_context(|| format!("Failed to write run report to {}", output_path.display()))?;

    Ok(output_path)
}

/// Path relative to `root` joined with `/`, or the full path when it lies
/// outside `root`
fn relative_id(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}
