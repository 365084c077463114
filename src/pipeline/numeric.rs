//! Numeric variable summaries: percentiles, mean and standard deviation
//!
//! Every requested column present in the table is coerced to `f64`. Cells
//! that are null stay missing; cells that hold text which does not parse as a
//! number are excluded as well, and the row indices of those exclusions are
//! kept in a [`CoercionReport`] so callers can see exactly what was dropped.

use polars::prelude::*;

use super::columns::select_columns;
use super::error::{SummaryError, SummaryResult};

/// Percentiles reported for each numeric variable
pub const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Descriptive statistics for a single numeric variable
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub variable: String,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (divisor n - 1)
    pub sd: f64,
}

/// What the numeric coercion did to one column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub column: String,
    /// Null (or NaN) cells
    pub missing: usize,
    /// Rows holding a value that could not be parsed as a number
    pub excluded_rows: Vec<usize>,
}

impl CoercionReport {
    /// Total number of cells left out of the statistics
    pub fn dropped(&self) -> usize {
        self.missing + self.excluded_rows.len()
    }
}

/// Valid values of a column after coercion, plus the coercion report
#[derive(Debug, Clone)]
pub struct CoercedColumn {
    pub values: Vec<f64>,
    pub report: CoercionReport,
}

/// Result of summarizing a set of numeric columns
#[derive(Debug, Clone, Default)]
pub struct NumericReport {
    pub rows: Vec<NumericSummary>,
    pub coercion: Vec<CoercionReport>,
    /// Requested columns absent from the table
    pub missing_columns: Vec<String>,
}

/// Summarize every requested numeric column present in `df`.
///
/// Fails with [`SummaryError::InsufficientData`] on the first column that has
/// fewer than two valid values.
pub fn summarize_numeric(df: &DataFrame, requested: &[String]) -> SummaryResult<NumericReport> {
    let selection = select_columns(df, requested);
    let mut report = NumericReport {
        rows: Vec::with_capacity(selection.present.len()),
        coercion: Vec::with_capacity(selection.present.len()),
        missing_columns: selection.missing,
    };

    for name in &selection.present {
        let column = df.column(name)?;
        let coerced = coerce_numeric(column)?;
        let summary = describe(name, &coerced.values)?;
        report.rows.push(summary);
        report.coercion.push(coerced.report);
    }

    Ok(report)
}

/// Coerce a column to `f64`, separating valid values from dropped cells.
pub fn coerce_numeric(column: &Column) -> SummaryResult<CoercedColumn> {
    let name = column.name().to_string();

    let coerced = match column.dtype() {
        DataType::String => coerce_text(&name, column.str()?.into_iter()),
        dtype if dtype.is_primitive_numeric() || matches!(dtype, DataType::Boolean) => {
            let cast = column.cast(&DataType::Float64)?;
            let mut values = Vec::with_capacity(cast.len());
            let mut missing = 0usize;
            for cell in cast.f64()?.into_iter() {
                match cell {
                    Some(v) if !v.is_nan() => values.push(v),
                    _ => missing += 1,
                }
            }
            CoercedColumn {
                values,
                report: CoercionReport {
                    column: name.clone(),
                    missing,
                    excluded_rows: Vec::new(),
                },
            }
        }
        _ => {
            let cast = column.cast(&DataType::String)?;
            coerce_text(&name, cast.str()?.into_iter())
        }
    };

    if !coerced.report.excluded_rows.is_empty() {
        log::info!(
            "column '{}': excluded {} non-numeric value(s) at rows {:?}",
            name,
            coerced.report.excluded_rows.len(),
            coerced.report.excluded_rows
        );
    }
    log::debug!(
        "column '{}': {} valid, {} missing",
        name,
        coerced.values.len(),
        coerced.report.missing
    );

    Ok(coerced)
}

fn coerce_text<'a>(name: &str, cells: impl Iterator<Item = Option<&'a str>>) -> CoercedColumn {
    let mut values = Vec::new();
    let mut missing = 0usize;
    let mut excluded_rows = Vec::new();

    for (row, cell) in cells.enumerate() {
        match cell.map(str::trim) {
            None | Some("") => missing += 1,
            Some(text) => match text.parse::<f64>() {
                Ok(v) if v.is_nan() => missing += 1,
                Ok(v) => values.push(v),
                Err(_) => excluded_rows.push(row),
            },
        }
    }

    CoercedColumn {
        values,
        report: CoercionReport {
            column: name.to_string(),
            missing,
            excluded_rows,
        },
    }
}

/// Compute the summary statistics for one column's valid values.
pub fn describe(variable: &str, values: &[f64]) -> SummaryResult<NumericSummary> {
    if values.len() < 2 {
        return Err(SummaryError::InsufficientData {
            column: variable.to_string(),
            valid: values.len(),
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let (mean, sd) = mean_and_sd(&sorted, min, max);

    Ok(NumericSummary {
        variable: variable.to_string(),
        p25: percentile(&sorted, QUARTILES[0]),
        median: percentile(&sorted, QUARTILES[1]),
        p75: percentile(&sorted, QUARTILES[2]),
        min,
        max,
        mean,
        sd,
    })
}

/// Mean and sample SD (divisor n - 1) of at least two sorted values.
///
/// Identical values give exactly `(min, 0.0)`. Otherwise deviations are taken
/// from `min` so the mean cannot drift outside `[min, max]`.
fn mean_and_sd(sorted: &[f64], min: f64, max: f64) -> (f64, f64) {
    if min == max {
        return (min, 0.0);
    }

    let n = sorted.len() as f64;
    let shift = sorted.iter().map(|v| v - min).sum::<f64>() / n;
    let mean = (min + shift).clamp(min, max);
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Linear-interpolation percentile of already sorted values.
///
/// `pct` is in `[0, 100]`. Uses the rank `(n - 1) * pct / 100` and
/// interpolates between the neighbouring order statistics. Returns NaN for an
/// empty slice.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (n - 1) as f64 * (pct / 100.0).clamp(0.0, 1.0);
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = rank - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}
