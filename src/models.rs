//! Run-level data structures.
//!
//! Per-file outcomes produced by the station pipeline and the statistics
//! reported at the end of a batch run.

use crate::stats::StationSummary;
use serde::Serialize;
use std::path::PathBuf;

/// Result of computing one discovered station file
#[derive(Debug, Clone)]
pub enum StationOutcome {
    /// A summary row for the station
    Summary(StationSummary),
    /// The file was read but nothing survived cleaning
    NoData { path: PathBuf },
    /// The file could not be read or summarised
    Failed(StationFailure),
}

impl StationOutcome {
    pub fn summary(self) -> Option<StationSummary> {
        match self {
            StationOutcome::Summary(summary) => Some(summary),
            _ => None,
        }
    }
}

/// A station file that failed, with the reason
#[derive(Debug, Clone, Serialize)]
pub struct StationFailure {
    pub gauge_id: Option<String>,
    pub path: PathBuf,
    pub reason: String,
}

/// Processing statistics
#[derive(Debug, Default, Serialize)]
pub struct ProcessingStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    /// Zero-byte files skipped at discovery
    pub files_empty: usize,
    /// Files with no rows left after cleaning
    pub files_no_data: usize,
    pub files_failed: usize,
    pub failures: Vec<StationFailure>,
    pub stations_written: usize,
    pub duplicate_gauges: Vec<String>,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    /// True when every discovered file produced a row or was legitimately empty
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0 && self.duplicate_gauges.is_empty()
    }
}
