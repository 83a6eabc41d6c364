//! Gauge Statistics Library
//!
//! A Rust library for summarising stream gauge discharge records into one
//! table of descriptive statistics, one row per station.
//!
//! This library provides tools for:
//! - Reading per-station CSV records with a timestamp column and numeric channels
//! - Cleaning records under a configurable policy (missing values, negative readings)
//! - Per-channel descriptive statistics with linear quantiles and sample moments
//! - Temporal coverage: monthly observation counts, gaps and years of operation
//! - Aggregating stations into a sorted summary table written as CSV or Parquet
//! - Histogram and boxplot data for every summary column
//!
//! ```no_run
//! use gauge_stats::{RawSeries, StationStatsCalculator, StatsConfig, SummaryAggregator};
//! use std::path::Path;
//!
//! # fn main() -> gauge_stats::Result<()> {
//! let calculator = StationStatsCalculator::new(StatsConfig::default());
//! let raw = RawSeries::from_csv_path(Path::new("Observed_Data/peru_001.csv"))?;
//! let row = calculator.compute(&raw, "peru_001")?;
//! let table = SummaryAggregator::aggregate(vec![row]);
//! println!("{}", table.to_dataframe()?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod distribution;
pub mod error;
pub mod models;
pub mod processor;
pub mod series;
pub mod stats;
pub mod summary;

pub use config::{GapDefinition, GaugeConfig, OutputFormat, StatsConfig};
pub use error::{GaugeError, Result};
pub use processor::GaugeProcessor;
pub use series::RawSeries;
pub use stats::{ChannelStats, StationStatsCalculator, StationSummary};
pub use summary::{SummaryAggregator, SummaryTable};
