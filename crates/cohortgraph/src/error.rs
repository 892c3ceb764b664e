//! Error types for the cohortgraph library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cohortgraph operations.
#[derive(Debug, Error)]
pub enum CohortGraphError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Feature schema YAML could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP failure talking to an identity service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A resolved column does not carry the name of its schema entry.
    #[error("Schema mismatch: feature '{feature}' resolved to column '{column}'")]
    SchemaMismatch { feature: String, column: String },

    /// A raw value could not be encoded for an integer column.
    #[error("Cannot encode value '{value}' in column '{column}' at row {row}")]
    Encoding {
        column: String,
        row: usize,
        value: String,
    },

    /// Association statistics could not be computed for a pair.
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CohortGraphError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CohortGraphError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for cohortgraph operations.
pub type Result<T> = std::result::Result<T, CohortGraphError>;
