//! Cohort windows, de-duplication and outcome filtering
//!
//! A cohort is the set of rows whose timestamp falls inside a window, with
//! exact duplicate rows removed. Outcome subsets further split a cohort by a
//! 0/1 label column.

use std::ops::Bound;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;

use super::error::{SummaryError, SummaryResult};
use super::loader::column_timestamps;

/// Tolerance for comparing outcome labels read as floats
const LABEL_TOLERANCE: f64 = 1e-9;

/// A named timestamp range defining one cohort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortWindow {
    pub name: String,
    pub start: Bound<NaiveDateTime>,
    pub end: Bound<NaiveDateTime>,
}

impl CohortWindow {
    pub fn new(name: impl Into<String>, start: Bound<NaiveDateTime>, end: Bound<NaiveDateTime>) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Whether `ts` lies inside the window
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let after_start = match &self.start {
            Bound::Included(start) => ts >= start,
            Bound::Excluded(start) => ts > start,
            Bound::Unbounded => true,
        };
        let before_end = match &self.end {
            Bound::Included(end) => ts <= end,
            Bound::Excluded(end) => ts < end,
            Bound::Unbounded => true,
        };
        after_start && before_end
    }
}

impl std::fmt::Display for CohortWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = match &self.start {
            Bound::Included(ts) => format!("[{}", ts),
            Bound::Excluded(ts) => format!("({}", ts),
            Bound::Unbounded => "(-inf".to_string(),
        };
        let close = match &self.end {
            Bound::Included(ts) => format!("{}]", ts),
            Bound::Excluded(ts) => format!("{})", ts),
            Bound::Unbounded => "+inf)".to_string(),
        };
        write!(f, "{} {}, {}", self.name, open, close)
    }
}

/// Rows of a cohort selected by an outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeSubset {
    /// Every row of the cohort
    All,
    /// Rows whose label equals the given value
    Label(u8),
}

impl OutcomeSubset {
    /// The three subsets reported for every cohort and outcome
    pub const REPORTED: [OutcomeSubset; 3] = [
        OutcomeSubset::All,
        OutcomeSubset::Label(0),
        OutcomeSubset::Label(1),
    ];

    /// Suffix used in report file names
    pub fn suffix(&self) -> String {
        match self {
            OutcomeSubset::All => "all".to_string(),
            OutcomeSubset::Label(value) => value.to_string(),
        }
    }
}

impl std::fmt::Display for OutcomeSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Select the rows of `df` whose `timestamp_column` lies in `window`, then
/// drop exact duplicate rows. Rows with a missing timestamp are excluded.
pub fn split_cohort(df: &DataFrame, timestamp_column: &str, window: &CohortWindow) -> Result<DataFrame> {
    let column = df
        .column(timestamp_column)
        .with_context(|| format!("Timestamp column '{}' not found", timestamp_column))?;

    let mask: Vec<bool> = column_timestamps(column)?
        .iter()
        .map(|ts| ts.as_ref().is_some_and(|ts| window.contains(ts)))
        .collect();

    let in_window = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
    let cohort = drop_duplicate_rows(&in_window)?;

    log::info!(
        "cohort {}: {} row(s) in window, {} after de-duplication",
        window,
        in_window.height(),
        cohort.height()
    );
    Ok(cohort)
}

/// Remove rows identical to an earlier row, keeping first occurrences in order.
///
/// Nulls compare equal to each other.
pub fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame> {
    let unique = df
        .unique_stable(None, UniqueKeepStrategy::First, None)
        .context("Failed to remove duplicate rows")?;

    let removed = df.height() - unique.height();
    if removed > 0 {
        log::debug!("removed {} duplicate row(s)", removed);
    }
    Ok(unique)
}

/// Rows of `df` belonging to an outcome subset.
///
/// Labels are compared numerically, so `1`, `1.0` and `"1"` all match
/// `Label(1)`. Missing or non-numeric labels match no label subset.
pub fn filter_outcome(
    df: &DataFrame,
    outcome_column: &str,
    subset: OutcomeSubset,
) -> SummaryResult<DataFrame> {
    let target = match subset {
        OutcomeSubset::All => return Ok(df.clone()),
        OutcomeSubset::Label(value) => value as f64,
    };

    let column = df
        .column(outcome_column)
        .map_err(|_| SummaryError::MissingColumn {
            column: outcome_column.to_string(),
        })?;

    let labels = match column.dtype() {
        DataType::String => {
            let parsed: Vec<Option<f64>> = column
                .str()?
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect();
            parsed
        }
        _ => column.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
    };

    let mask: Vec<bool> = labels
        .iter()
        .map(|label| label.is_some_and(|v| (v - target).abs() < LABEL_TOLERANCE))
        .collect();

    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}
