//! Error handling for gauge statistics operations.
//!
//! Provides error types with file context for reading station records,
//! parsing timestamps, aggregating summaries and writing output.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaugeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Input directory not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid station file: {path} - {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Unparseable timestamp '{value}' at row {row} in {path}")]
    TimestampParse {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Duplicate gauge identifiers in summary: {}", .gauge_ids.join(", "))]
    DuplicateGauge { gauge_ids: Vec<String> },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, GaugeError>;
