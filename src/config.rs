//! Load configuration.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options applied when a dataset is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Raw samples averaged into one reduced sample.
    pub reduction_factor: i64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            reduction_factor: 1,
        }
    }
}

impl LoadOptions {
    pub fn with_reduction_factor(reduction_factor: i64) -> Self {
        Self { reduction_factor }
    }

    /// Read options from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
