//! Per-station statistics.
//!
//! [`StationStatsCalculator`] turns one raw station table into at most one
//! [`StationSummary`]: the table is cleaned, every channel gets its own
//! descriptive statistics, and the station gets one set of coverage figures.
//! A station with no usable rows yields `None`, which callers treat as
//! "no data" rather than as a failure.

pub mod coverage;
pub mod descriptive;

use self::coverage::Coverage;
use self::descriptive::Descriptive;

use crate::config::StatsConfig;
use crate::error::{GaugeError, Result};
use crate::series::RawSeries;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Statistics of one measurement channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub q1: f64,
    pub q3: f64,
    pub max: f64,
    pub skew: Option<f64>,
    pub stdev: Option<f64>,
    pub n: u64,
    /// Observations per distinct calendar year of operation
    pub yearly_avg: f64,
}

/// One summary row for a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub gauge_id: String,
    pub channels: Vec<ChannelStats>,
    /// Observations per calendar month, January first
    pub monthly_counts: [u64; 12],
    pub n_gaps: u64,
    pub last_obs: NaiveDateTime,
    pub first_year: i32,
    pub last_year: i32,
}

impl StationSummary {
    /// Statistics for the named channel
    pub fn channel(&self, name: &str) -> Option<&ChannelStats> {
        self.channels.iter().find(|c| c.channel == name)
    }

    /// Statistics of the first channel, the discharge column for most inputs
    pub fn primary(&self) -> Option<&ChannelStats> {
        self.channels.first()
    }
}

/// Computes station summaries under one cleaning and statistics policy
#[derive(Debug, Clone, Default)]
pub struct StationStatsCalculator {
    config: StatsConfig,
}

impl StationStatsCalculator {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Clean `raw` and summarise it under `station_id`.
    ///
    /// Returns `Ok(None)` when nothing survives cleaning. Unparseable
    /// timestamps on surviving rows are an error.
    pub fn compute(&self, raw: &RawSeries, station_id: &str) -> Result<Option<StationSummary>> {
        let cleaned = raw.clean(&self.config)?;
        if cleaned.is_empty() {
            debug!("No usable rows for station {}", station_id);
            return Ok(None);
        }

        let Some(coverage) = Coverage::from_timestamps(
            &cleaned.timestamps,
            self.config.gap_definition,
            self.config.gap_threshold_days,
        ) else {
            return Ok(None);
        };

        let mut channels = Vec::with_capacity(cleaned.channels.len());
        for (name, values) in &cleaned.channels {
            let Some(stats) = Descriptive::from_values(values) else {
                continue;
            };
            channels.push(ChannelStats {
                channel: name.clone(),
                mean: stats.mean,
                median: stats.median,
                min: stats.min,
                q1: stats.q1,
                q3: stats.q3,
                max: stats.max,
                skew: stats.skew,
                stdev: stats.stdev,
                n: stats.n as u64,
                yearly_avg: stats.n as f64 / coverage.distinct_years as f64,
            });
        }

        if channels.is_empty() {
            return Ok(None);
        }

        debug!(
            "Station {}: {} rows, {} channels, {} gaps",
            station_id,
            cleaned.len(),
            channels.len(),
            coverage.n_gaps
        );

        Ok(Some(StationSummary {
            gauge_id: station_id.to_string(),
            channels,
            monthly_counts: coverage.monthly_counts,
            n_gaps: coverage.n_gaps,
            last_obs: coverage.last_obs,
            first_year: coverage.first_year,
            last_year: coverage.last_year,
        }))
    }

    /// Read a station file and summarise it under its file stem
    pub fn compute_file(&self, path: &Path) -> Result<Option<StationSummary>> {
        let gauge_id = gauge_id_from_path(path)?;
        let raw = RawSeries::from_csv_path(path)?;
        self.compute(&raw, &gauge_id)
    }
}

/// Station identifier from a file name, without its extension
pub fn gauge_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GaugeError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "cannot derive a gauge identifier from the file name".to_string(),
        })
}
