//! Dataset loading for the generated-variables, outcomes and intraop tables

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Encounter identifier shared by the feature and outcome tables
pub const ENCOUNTER_ID_COLUMN: &str = "encounter_deiden_id";
/// Scheduled start time; part of the composite merge key
pub const SCHEDULED_START_COLUMN: &str = "sched_start_datetime";
/// Legacy name of [`SCHEDULED_START_COLUMN`] in the generated-variables file
pub const LEGACY_SCHEDULED_START_COLUMN: &str = "sched_start_time";
/// Timestamp used to assign encounters to cohorts
pub const ANESTHESIA_START_COLUMN: &str = "anesthesia_start_datetime";
/// Patient identifier dropped from intraop tables before summarizing
pub const PATIENT_ID_COLUMN: &str = "patient_deiden_id";

/// Outcome columns of the outcomes file and the label each is renamed to
pub const DEFAULT_OUTCOME_MAP: [(&str, &str); 4] = [
    ("sepsis", "sepsispred"),
    ("mv_greater_2days", "mvcomppred"),
    ("neuro_delirium_comb", "neurodelpred"),
    ("ICU_gt_2d", "icucomppred"),
];

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Text encoding of an input CSV
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1, decoded to UTF-8 before parsing
    Latin1,
}

impl std::str::FromStr for InputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(InputEncoding::Utf8),
            "latin1" | "iso88591" => Ok(InputEncoding::Latin1),
            _ => Err(format!("Unknown encoding: '{}'. Use 'utf8' or 'latin1'.", s)),
        }
    }
}

/// Options for reading a CSV file
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub encoding: InputEncoding,
    /// Rows used for schema inference; `None` scans the whole file
    pub infer_schema_length: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            encoding: InputEncoding::Utf8,
            infer_schema_length: Some(10_000),
        }
    }
}

impl CsvOptions {
    pub fn with_encoding(mut self, encoding: InputEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Load a CSV file into memory
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<DataFrame> {
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length);

    let df = match options.encoding {
        InputEncoding::Utf8 => read_options
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        InputEncoding::Latin1 => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
            let text = encoding_rs::mem::decode_latin1(&bytes).into_owned();
            read_options
                .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
                .finish()
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        }
    };

    log::info!(
        "loaded {} ({} rows x {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Get the column names of a CSV file without loading its rows
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = LazyCsvReader::new(path)
        .finish()
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?
        .collect_schema()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Load the per-encounter generated-variables table.
///
/// Renames the legacy scheduled-start column and parses the anesthesia start
/// timestamp into a `Datetime` column.
pub fn load_generated_variables(path: &Path, options: &CsvOptions) -> Result<DataFrame> {
    let mut df = load_csv(path, options)?;

    if df.get_column_index(LEGACY_SCHEDULED_START_COLUMN).is_some() {
        df.rename(LEGACY_SCHEDULED_START_COLUMN, SCHEDULED_START_COLUMN.into())?;
    }

    parse_datetime_column(&mut df, ANESTHESIA_START_COLUMN)
        .with_context(|| format!("Invalid generated-variables file: {}", path.display()))?;
    Ok(df)
}

/// Load the outcomes table, keeping the merge keys and the renamed outcome columns.
pub fn load_outcomes(path: &Path, outcome_map: &[(String, String)]) -> Result<DataFrame> {
    let df = load_csv(path, &CsvOptions::default())?;

    let mut keep: Vec<&str> = vec![ENCOUNTER_ID_COLUMN, SCHEDULED_START_COLUMN];
    keep.extend(outcome_map.iter().map(|(source, _)| source.as_str()));

    let mut df = df
        .select(keep)
        .with_context(|| format!("Outcomes file is missing required columns: {}", path.display()))?;

    for (source, label) in outcome_map {
        df.rename(source, label.as_str().into())?;
    }

    Ok(df)
}

/// Left-join outcome labels onto the feature table on a composite key.
///
/// Key columns are cast to text on both sides so that an identifier inferred
/// as an integer in one file and as text in the other still matches.
pub fn merge_outcomes(features: DataFrame, outcomes: DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let features = keys_as_text(features, keys).context("Feature table is missing merge keys")?;
    let outcomes = keys_as_text(outcomes, keys).context("Outcomes table is missing merge keys")?;

    let on: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    let merged = features
        .lazy()
        .join(outcomes.lazy(), on.clone(), on, JoinArgs::new(JoinType::Left))
        .collect()
        .context("Failed to merge outcomes")?;

    log::info!("merged outcomes: {} rows", merged.height());
    Ok(merged)
}

fn keys_as_text(mut df: DataFrame, keys: &[&str]) -> Result<DataFrame> {
    for key in keys {
        let text = df
            .column(key)
            .with_context(|| format!("Column '{}' not found", key))?
            .cast(&DataType::String)?;
        df.with_column(text)?;
    }
    Ok(df)
}

/// Load an intraop cohort file: numeric columns only, patient identifier removed.
pub fn load_intraop_cohort(path: &Path, options: &CsvOptions) -> Result<DataFrame> {
    let df = load_csv(path, options)?;

    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype().is_primitive_numeric())
        .map(|column| column.name().to_string())
        .filter(|name| name != PATIENT_ID_COLUMN)
        .collect();

    let dropped = df.width() - numeric.len();
    if dropped > 0 {
        log::debug!(
            "{}: dropped {} non-numeric or identifier column(s)",
            path.display(),
            dropped
        );
    }

    Ok(df.select(numeric)?)
}

/// Parse a text timestamp in one of the accepted formats.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Read a column as timestamps.
///
/// Accepts `Datetime`, `Date` and text columns; anything else is rendered as
/// text first. Unparseable cells become `None`.
pub fn column_timestamps(column: &Column) -> Result<Vec<Option<NaiveDateTime>>> {
    let timestamps = match column.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = column.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .map(|v| v.and_then(|v| from_epoch(v, unit)))
                .collect()
        }
        DataType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
            let raw = column.cast(&DataType::Int32)?;
            raw.i32()?
                .into_iter()
                .map(|v| {
                    let days = chrono::Duration::days(v? as i64);
                    epoch.map(|e| e + days)
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_timestamp))
            .collect(),
        _ => {
            let cast = column.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp))
                .collect()
        }
    };
    Ok(timestamps)
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    datetime.map(|dt| dt.naive_utc())
}

/// Replace a text column with a millisecond `Datetime` column.
pub fn parse_datetime_column(df: &mut DataFrame, name: &str) -> Result<()> {
    let column = df
        .column(name)
        .with_context(|| format!("Timestamp column '{}' not found", name))?;

    if matches!(column.dtype(), DataType::Datetime(_, _)) {
        return Ok(());
    }

    let before_nulls = column.null_count();
    let parsed = column_timestamps(column)?;
    let millis = parsed
        .iter()
        .map(|ts| ts.map(|ts| ts.and_utc().timestamp_millis()));
    let datetime = Int64Chunked::from_iter_options(name.into(), millis)
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series();

    let unparsed = datetime.null_count().saturating_sub(before_nulls);
    if unparsed > 0 {
        log::warn!(
            "column '{}': {} value(s) could not be parsed as timestamps and are treated as missing",
            name,
            unparsed
        );
    }

    df.with_column(datetime)?;
    Ok(())
}
