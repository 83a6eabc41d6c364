//! Configuration management and validation.
//!
//! Provides the statistics policy used by the station calculator and the
//! batch settings used by the processor. Values are layered: defaults, then
//! an optional TOML file, then command-line overrides.

use crate::constants::{DEFAULT_FILE_PATTERN, DEFAULT_GAP_THRESHOLD_DAYS};
use crate::error::{GaugeError, Result};
use clap::ValueEnum;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How gaps in a station record are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GapDefinition {
    /// Successive sorted timestamps further apart than the threshold
    #[default]
    SuccessiveDiff,
    /// Calendar months without observations between the first and last month
    MonthlyResample,
}

/// Summary table file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Supported compression algorithms for parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Cleaning and statistics policy for a single station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Drop rows holding a negative value in any channel
    pub drop_negative: bool,

    /// Gap counting strategy
    pub gap_definition: GapDefinition,

    /// Whole-day distance above which successive observations form a gap
    pub gap_threshold_days: i64,

    /// Exclude non-numeric columns instead of rejecting the file
    pub numeric_only: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            drop_negative: true,
            gap_definition: GapDefinition::SuccessiveDiff,
            gap_threshold_days: DEFAULT_GAP_THRESHOLD_DAYS,
            numeric_only: true,
        }
    }
}

impl StatsConfig {
    /// Keep negative readings as valid data
    pub fn keep_negative(mut self) -> Self {
        self.drop_negative = false;
        self
    }

    /// Select the gap counting strategy
    pub fn with_gap_definition(mut self, gap_definition: GapDefinition) -> Self {
        self.gap_definition = gap_definition;
        self
    }

    /// Set the gap threshold in days
    pub fn with_gap_threshold_days(mut self, days: i64) -> Self {
        self.gap_threshold_days = days;
        self
    }

    /// Reject files with non-numeric columns
    pub fn strict_numeric(mut self) -> Self {
        self.numeric_only = false;
        self
    }
}

/// Global configuration for a gauge statistics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    /// Maximum stations computed concurrently
    pub max_concurrent_files: usize,

    /// Glob pattern for station files, relative to the input directory
    pub file_pattern: String,

    /// Skip zero-byte files during discovery
    pub skip_empty_files: bool,

    /// Abort the run when two files map to the same gauge identifier
    pub fail_on_duplicate_gauge: bool,

    /// Summary table format
    pub output_format: OutputFormat,

    /// Compression used for parquet output
    pub compression: CompressionAlgorithm,

    /// Per-station statistics policy
    pub stats: StatsConfig,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: num_cpus::get().max(1),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            skip_empty_files: true,
            fail_on_duplicate_gauge: false,
            output_format: OutputFormat::Csv,
            compression: CompressionAlgorithm::Snappy,
            stats: StatsConfig::default(),
        }
    }
}

impl GaugeConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: GaugeConfig = toml::from_str(&contents)?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_files == 0 {
            return Err(GaugeError::Configuration {
                message: "max_concurrent_files must be at least 1".to_string(),
            });
        }
        if self.file_pattern.trim().is_empty() {
            return Err(GaugeError::Configuration {
                message: "file_pattern must not be empty".to_string(),
            });
        }
        if self.stats.gap_threshold_days < 0 {
            return Err(GaugeError::Configuration {
                message: format!(
                    "gap_threshold_days must not be negative, got {}",
                    self.stats.gap_threshold_days
                ),
            });
        }
        Ok(())
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Set the discovery glob pattern
    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Abort on duplicate gauge identifiers
    pub fn with_fail_on_duplicate(mut self) -> Self {
        self.fail_on_duplicate_gauge = true;
        self
    }

    /// Select the summary table format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Select parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Replace the statistics policy
    pub fn with_stats(mut self, stats: StatsConfig) -> Self {
        self.stats = stats;
        self
    }
}
