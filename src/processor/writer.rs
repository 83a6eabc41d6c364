//! Summary table writing
//!
//! Renders the aggregated table through polars and writes it as CSV or
//! Parquet, creating parent directories as needed.

use crate::config::{CompressionAlgorithm, OutputFormat};
use crate::constants::LAST_OBS_CSV_FORMAT;
use crate::error::{GaugeError, Result};
use crate::summary::SummaryTable;

use polars::prelude::{
    CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, SerWriter, StatisticsOptions,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes a summary table to one output file
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    output_path: PathBuf,
    format: OutputFormat,
    compression: CompressionAlgorithm,
}

impl SummaryWriter {
    /// Create a new writer
    pub fn new(output_path: PathBuf, format: OutputFormat) -> Self {
        Self {
            output_path,
            format,
            compression: CompressionAlgorithm::default(),
        }
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write `table`, returning the number of rows written
    pub fn write(&self, table: &SummaryTable) -> Result<usize> {
        let mut df = table.to_dataframe()?;

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match self.format {
            OutputFormat::Csv => self.write_csv(&mut df)?,
            OutputFormat::Parquet => self.write_parquet(&mut df)?,
        }

        debug!(
            "Wrote {} rows x {} columns to {}",
            df.height(),
            df.width(),
            self.output_path.display()
        );
        Ok(df.height())
    }

    fn write_csv(&self, df: &mut DataFrame) -> Result<()> {
        let mut file = File::create(&self.output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_datetime_format(Some(LAST_OBS_CSV_FORMAT.to_string()))
            .finish(df)
            .map_err(|e| GaugeError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Failed to write CSV summary: {}", e),
            })
    }

    fn write_parquet(&self, df: &mut DataFrame) -> Result<()> {
        let file = File::create(&self.output_path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .with_statistics(StatisticsOptions::full())
            .finish(df)
            .map_err(|e| GaugeError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Failed to write parquet summary: {}", e),
            })?;
        Ok(())
    }
}
