//! Requested-column selection shared by the summarizers

use std::collections::HashSet;

use polars::prelude::*;

/// Requested columns split into those present in a table and those absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Requested columns found in the table, in table order
    pub present: Vec<String>,
    /// Requested columns not found in the table, in request order
    pub missing: Vec<String>,
}

/// Intersect `requested` with the columns of `df`.
///
/// The present columns keep the table's order, not the request order, so that
/// reports list variables the way the source file does.
pub fn select_columns(df: &DataFrame, requested: &[String]) -> ColumnSelection {
    let wanted: HashSet<&str> = requested.iter().map(|s| s.as_str()).collect();

    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| wanted.contains(name.as_str()))
        .map(|name| name.to_string())
        .collect();

    let found: HashSet<&str> = present.iter().map(|s| s.as_str()).collect();
    let mut seen = HashSet::new();
    let missing: Vec<String> = requested
        .iter()
        .filter(|name| !found.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect();

    for column in &missing {
        log::debug!("requested column '{}' not present in input; skipping", column);
    }

    ColumnSelection { present, missing }
}
