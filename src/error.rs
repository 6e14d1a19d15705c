use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating filters, loading trip data or reporting on it.
#[derive(Error, Debug)]
pub enum BikeshareError {
    /// A city, month or day string outside the permitted set.
    #[error("Invalid {kind}: '{value}'")]
    InvalidFilterInput { kind: &'static str, value: String },

    #[error("No dataset for city '{city}' (looked for {path})")]
    DatasetNotFound { city: String, path: PathBuf },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A required cell that is empty or does not parse. Aborts the load.
    #[error("Malformed record at row {row_index}: column '{column}' has value {}", display_raw(.raw))]
    MalformedRecord {
        column: String,
        row_index: usize,
        raw: Option<String>,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_raw(raw: &Option<String>) -> String {
    match raw {
        Some(value) => format!("'{value}'"),
        None => "<missing>".to_string(),
    }
}
