//! Feature dictionary: which variables are numeric, categorical or binary
//!
//! The dictionary is an external CSV with a `feature_name` and a
//! `feature_type` column. Type codes are `num`, `cat` and `bin`.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::loader::{load_csv, CsvOptions};

pub const FEATURE_NAME_COLUMN: &str = "feature_name";
pub const FEATURE_TYPE_COLUMN: &str = "feature_type";

/// Classification of a variable for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariableType {
    Numerical,
    Categorical,
    Binary,
}

impl VariableType {
    pub const ALL: [VariableType; 3] = [
        VariableType::Numerical,
        VariableType::Categorical,
        VariableType::Binary,
    ];

    /// Dictionary code for this type
    pub fn code(&self) -> &'static str {
        match self {
            VariableType::Numerical => "num",
            VariableType::Categorical => "cat",
            VariableType::Binary => "bin",
        }
    }

    /// Directory name used in report paths
    pub fn dir_name(&self) -> &'static str {
        match self {
            VariableType::Numerical => "numerical",
            VariableType::Categorical => "categorical",
            VariableType::Binary => "binary",
        }
    }

    /// Look up a dictionary code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "num" => Some(VariableType::Numerical),
            "cat" => Some(VariableType::Categorical),
            "bin" => Some(VariableType::Binary),
            _ => None,
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Variable names grouped by type, in dictionary order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureDictionary {
    numerical: Vec<String>,
    categorical: Vec<String>,
    binary: Vec<String>,
}

impl FeatureDictionary {
    /// Load a dictionary CSV from disk
    pub fn load(path: &Path) -> Result<Self> {
        let df = load_csv(path, &CsvOptions::default())
            .with_context(|| format!("Failed to load feature dictionary: {}", path.display()))?;
        Self::from_frame(&df)
            .with_context(|| format!("Invalid feature dictionary: {}", path.display()))
    }

    /// Build a dictionary from an already loaded table
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let names = string_cells(df, FEATURE_NAME_COLUMN)?;
        let types = string_cells(df, FEATURE_TYPE_COLUMN)?;

        let mut dictionary = FeatureDictionary::default();
        let mut unknown = 0usize;

        for (name, code) in names.into_iter().zip(types) {
            let (Some(name), Some(code)) = (name, code) else {
                unknown += 1;
                continue;
            };
            match VariableType::from_code(&code) {
                Some(kind) => dictionary.push(kind, name),
                None => {
                    log::debug!("feature '{}' has unknown type code '{}'; skipping", name, code);
                    unknown += 1;
                }
            }
        }

        log::info!(
            "feature dictionary: {} numerical, {} categorical, {} binary, {} unclassified",
            dictionary.numerical.len(),
            dictionary.categorical.len(),
            dictionary.binary.len(),
            unknown
        );

        Ok(dictionary)
    }

    /// Build a dictionary directly from name lists
    pub fn from_lists(numerical: Vec<String>, categorical: Vec<String>, binary: Vec<String>) -> Self {
        Self {
            numerical,
            categorical,
            binary,
        }
    }

    pub fn push(&mut self, kind: VariableType, name: String) {
        match kind {
            VariableType::Numerical => self.numerical.push(name),
            VariableType::Categorical => self.categorical.push(name),
            VariableType::Binary => self.binary.push(name),
        }
    }

    /// Variables of the given type
    pub fn variables(&self, kind: VariableType) -> &[String] {
        match kind {
            VariableType::Numerical => &self.numerical,
            VariableType::Categorical => &self.categorical,
            VariableType::Binary => &self.binary,
        }
    }

    pub fn len(&self) -> usize {
        self.numerical.len() + self.categorical.len() + self.binary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn string_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found in feature dictionary", name))?;
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}
