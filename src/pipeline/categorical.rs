//! Categorical and binary variable summaries: counts and percentages
//!
//! Percentages use the total row count of the input table as denominator,
//! including rows where the column itself is missing. A column with missing
//! values therefore sums to less than 100%.

use std::collections::HashMap;

use polars::prelude::*;

use super::columns::select_columns;
use super::error::{SummaryError, SummaryResult};

/// One observed value of a categorical variable
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub variable: String,
    pub category: String,
    pub count: usize,
    /// `100 * count / total_rows`
    pub percentage: f64,
}

impl CategorySummary {
    /// Percentage as written in reports, e.g. `66.67%`
    pub fn percentage_label(&self) -> String {
        format_percentage(self.percentage)
    }
}

/// Result of summarizing a set of categorical columns
#[derive(Debug, Clone, Default)]
pub struct CategoricalReport {
    pub rows: Vec<CategorySummary>,
    /// Row count used as the percentage denominator
    pub total_rows: usize,
    /// Requested columns absent from the table
    pub missing_columns: Vec<String>,
}

/// Format a percentage with two decimals and a trailing `%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Count each distinct value of every requested column present in `df`.
///
/// Columns appear in table order; within a column values are ordered by
/// descending count, ties keeping first-appearance order.
pub fn summarize_categorical(
    df: &DataFrame,
    requested: &[String],
) -> SummaryResult<CategoricalReport> {
    let total_rows = df.height();
    if total_rows == 0 {
        return Err(SummaryError::EmptyTable);
    }

    let selection = select_columns(df, requested);
    let mut rows = Vec::new();

    for name in &selection.present {
        let column = df.column(name)?;
        for (category, count) in value_counts(column)? {
            rows.push(CategorySummary {
                variable: name.clone(),
                category,
                count,
                percentage: count as f64 / total_rows as f64 * 100.0,
            });
        }
    }

    Ok(CategoricalReport {
        rows,
        total_rows,
        missing_columns: selection.missing,
    })
}

/// Distinct non-missing values of a column with their counts.
///
/// Sorted by descending count; equal counts keep the order in which the value
/// was first seen.
pub fn value_counts(column: &Column) -> SummaryResult<Vec<(String, usize)>> {
    let labels = category_labels(column)?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for label in labels.into_iter().flatten() {
        match index.get(&label) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(label.clone(), counts.len());
                counts.push((label, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// Render every cell of a column as a category label; `None` for missing.
fn category_labels(column: &Column) -> SummaryResult<Vec<Option<String>>> {
    let labels: Vec<Option<String>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = column.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = column.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()).map(format_float_label))
                .collect()
        }
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { "True" } else { "False" }.to_string()))
            .collect(),
        _ => {
            let cast = column.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(labels)
}

/// Whole floats keep one decimal (`1.0`), others use shortest round-trip form.
fn format_float_label(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_percentages() {
        let df = df! { "grade" => ["A", "A", "B"] }.unwrap();

        let report = summarize_categorical(&df, &["grade".to_string()]).unwrap();

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].category, "A");
        assert_eq!(report.rows[0].count, 2);
        assert_eq!(report.rows[0].percentage_label(), "66.67%");
        assert_eq!(report.rows[1].category, "B");
        assert_eq!(report.rows[1].count, 1);
        assert_eq!(report.rows[1].percentage_label(), "33.33%");
    }

    #[test]
    fn test_empty_table_errors() {
        let df = df! { "grade" => Vec::<String>::new() }.unwrap();
        let err = summarize_categorical(&df, &["grade".to_string()]).unwrap_err();
        assert!(matches!(err, SummaryError::EmptyTable));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let df = df! { "c" => ["x", "y", "z", "y", "x", "w"] }.unwrap();

        let counts = value_counts(df.column("c").unwrap()).unwrap();

        assert_eq!(
            counts,
            vec![
                ("x".to_string(), 2),
                ("y".to_string(), 2),
                ("z".to_string(), 1),
                ("w".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_missing_values_excluded_but_counted_in_denominator() {
        let df = df! { "flag" => [Some(1i32), None, Some(1), Some(0)] }.unwrap();

        let report = summarize_categorical(&df, &["flag".to_string()]).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].category, "1");
        assert_eq!(report.rows[0].percentage_label(), "50.00%");
        assert_eq!(report.rows[1].category, "0");
        assert_eq!(report.rows[1].percentage_label(), "25.00%");
        let total: usize = report.rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_float_and_bool_labels() {
        let df = df! {
            "f" => [1.0f64, 2.5, 1.0, f64::NAN],
            "b" => [true, false, true, true],
        }
        .unwrap();
        let requested = vec!["f".to_string(), "b".to_string()];

        let report = summarize_categorical(&df, &requested).unwrap();

        let labels: Vec<(&str, &str, usize)> = report
            .rows
            .iter()
            .map(|r| (r.variable.as_str(), r.category.as_str(), r.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("f", "1.0", 2),
                ("f", "2.5", 1),
                ("b", "True", 3),
                ("b", "False", 1),
            ]
        );
    }

    #[test]
    fn test_columns_in_table_order() {
        let df = df! {
            "second" => ["a", "b"],
            "first" => ["c", "c"],
        }
        .unwrap();
        let requested = vec!["first".to_string(), "second".to_string()];

        let report = summarize_categorical(&df, &requested).unwrap();

        assert_eq!(report.rows[0].variable, "second");
        assert_eq!(report.rows[2].variable, "first");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(100.0), "100.00%");
        assert_eq!(format_percentage(0.0), "0.00%");
        assert_eq!(format_percentage(12.346), "12.35%");
    }
}
