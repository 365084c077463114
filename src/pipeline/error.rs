//! Error types for summarizing and writing cohort reports.
//!
//! `SummaryError` covers the failures a single report combination can hit.
//! The orchestrator catches these per combination and records them instead
//! of aborting the whole run.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while summarizing a table or writing its report.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A numeric column has fewer than two valid values after coercion.
    ///
    /// The sample standard deviation is undefined for n < 2.
    #[error("column '{column}' has {valid} valid numeric value(s); at least 2 are required")]
    InsufficientData {
        /// Column that could not be summarized
        column: String,
        /// Number of values left after dropping missing/unparseable cells
        valid: usize,
    },

    /// A categorical summary was requested for a table with zero rows.
    #[error("cannot compute category percentages for an empty table")]
    EmptyTable,

    /// A requested column is not present in the input table.
    #[error("requested column '{column}' is not present in the input")]
    MissingColumn { column: String },

    /// The report file or one of its parent directories could not be written.
    #[error("failed to write report to {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// Any other failure raised by the dataframe layer.
    #[error("data error: {0}")]
    Data(#[from] PolarsError),
}

/// Stable, serializable classification of a [`SummaryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InsufficientData,
    EmptyTable,
    MissingColumn,
    Write,
    Data,
    /// Input file for the combination could not be loaded
    Load,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::EmptyTable => "EmptyTable",
            ErrorKind::MissingColumn => "MissingColumn",
            ErrorKind::Write => "Write",
            ErrorKind::Data => "Data",
            ErrorKind::Load => "Load",
        };
        write!(f, "{}", name)
    }
}

impl SummaryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummaryError::InsufficientData { .. } => ErrorKind::InsufficientData,
            SummaryError::EmptyTable => ErrorKind::EmptyTable,
            SummaryError::MissingColumn { .. } => ErrorKind::MissingColumn,
            SummaryError::Write { .. } => ErrorKind::Write,
            SummaryError::Data(_) => ErrorKind::Data,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        SummaryError::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result alias for summary operations.
pub type SummaryResult<T> = std::result::Result<T, SummaryError>;
