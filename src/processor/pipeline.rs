//! Concurrent per-station computation
//!
//! Runs the station calculator over discovered files with bounded
//! parallelism and memory pressure detection. Outcomes are returned in
//! discovery order whatever order the workers finish in.

use crate::config::GaugeConfig;
use crate::error::{GaugeError, Result};
use crate::models::{StationFailure, StationOutcome};
use crate::stats::{StationStatsCalculator, gauge_id_from_path};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::System;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, error, warn};

/// Concurrent station pipeline
#[derive(Debug)]
pub struct StationPipeline {
    calculator: Arc<StationStatsCalculator>,
    max_concurrent_files: usize,
    system_monitor: Arc<Mutex<System>>,
    memory_threshold: f64,
    show_progress: bool,
}

impl StationPipeline {
    /// Create a new pipeline
    pub fn new(config: &GaugeConfig) -> Self {
        Self {
            calculator: Arc::new(StationStatsCalculator::new(config.stats.clone())),
            max_concurrent_files: config.max_concurrent_files.max(1),
            system_monitor: Arc::new(Mutex::new(System::new())),
            memory_threshold: 0.8, // 80% memory usage threshold
            show_progress: true,
        }
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check if system is under memory pressure
    pub async fn check_memory_pressure(&self) -> bool {
        let mut system = self.system_monitor.lock().await;
        system.refresh_memory();

        let used_memory = system.used_memory() as f64;
        let total_memory = system.total_memory() as f64;

        if total_memory == 0.0 {
            return false;
        }

        let memory_usage = used_memory / total_memory;
        let is_pressure = memory_usage > self.memory_threshold;

        if is_pressure {
            debug!(
                "Memory pressure detected: {:.1}% usage (threshold: {:.1}%)",
                memory_usage * 100.0,
                self.memory_threshold * 100.0
            );
        }

        is_pressure
    }

    fn progress_bar(&self, len: usize) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .map_err(|e| GaugeError::Configuration {
                    message: format!("Invalid progress template: {}", e),
                })?
                .progress_chars("#>-"),
        );
        pb.set_message("Computing stations");
        Ok(pb)
    }

    /// Compute every file, returning one outcome per file in input order
    pub async fn run(&self, files: &[PathBuf]) -> Result<Vec<StationOutcome>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let pb = self.progress_bar(files.len())?;

        let mut concurrent_limit = self.max_concurrent_files.min(files.len());
        if self.check_memory_pressure().await {
            concurrent_limit = (concurrent_limit / 2).max(1);
            debug!(
                "Memory pressure detected, reducing concurrency to {}",
                concurrent_limit
            );
        }

        let mut indexed: Vec<(usize, StationOutcome)> = stream::iter(files.iter().enumerate())
            .map(|(index, path)| {
                let pb = pb.clone();
                let calculator = Arc::clone(&self.calculator);
                async move {
                    if let Some(file_name) = path.file_name() {
                        pb.set_message(format!("Computing: {}", file_name.to_string_lossy()));
                    }
                    let outcome = compute_station(calculator, path).await;
                    pb.inc(1);
                    (index, outcome)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect()
            .await;

        pb.finish_with_message("All stations computed");

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

/// Compute one station on the blocking pool
async fn compute_station(calculator: Arc<StationStatsCalculator>, path: &Path) -> StationOutcome {
    let owned = path.to_path_buf();
    let result = task::spawn_blocking(move || calculator.compute_file(&owned))
        .await
        .map_err(|e| GaugeError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: format!("Station task failed: {}", e),
        })
        .and_then(|inner| inner);

    match result {
        Ok(Some(summary)) => {
            debug!("Computed station {} from {}", summary.gauge_id, path.display());
            StationOutcome::Summary(summary)
        }
        Ok(None) => {
            warn!("Skipped file (no data): {}", path.display());
            StationOutcome::NoData {
                path: path.to_path_buf(),
            }
        }
        Err(e) => {
            error!("Failed to process {}: {:#}", path.display(), e);
            StationOutcome::Failed(StationFailure {
                gauge_id: gauge_id_from_path(path).ok(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_pipeline() -> StationPipeline {
        StationPipeline::new(&GaugeConfig::default().with_max_concurrent_files(4))
            .without_progress()
    }

    #[tokio::test]
    async fn test_memory_pressure_detection() {
        let pipeline = create_test_pipeline();

        // Should not panic and return a boolean
        let _result = pipeline.check_memory_pressure().await;
        assert_eq!(pipeline.memory_threshold, 0.8);
    }

    #[tokio::test]
    async fn test_empty_file_list() {
        let pipeline = create_test_pipeline();
        let outcomes = pipeline.run(&[]).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_outcomes_follow_input_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..12 {
            let path = temp_dir.path().join(format!("g{:02}.csv", i));
            let rows = (1..=(i + 1) * 20)
                .map(|d| format!("2020-01-01 00:{:02}:00,{}\n", d % 60, d))
                .collect::<String>();
            fs::write(&path, format!("date,q\n{}", rows)).unwrap();
            files.push(path);
        }
        // reverse so discovery order is not alphabetical
        files.reverse();

        let outcomes = create_test_pipeline().run(&files).await.unwrap();
        let ids: Vec<String> = outcomes
            .into_iter()
            .map(|o| o.summary().unwrap().gauge_id)
            .collect();
        let expected: Vec<String> = (0..12).rev().map(|i| format!("g{:02}", i)).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_missing_and_empty_files_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let no_data = temp_dir.path().join("dry.csv");
        fs::write(&no_data, "date,q\n2020-01-01,-1\n").unwrap();
        let missing = temp_dir.path().join("gone.csv");

        let outcomes = create_test_pipeline()
            .run(&[no_data.clone(), missing.clone()])
            .await
            .unwrap();

        assert!(matches!(&outcomes[0], StationOutcome::NoData { path } if *path == no_data));
        match &outcomes[1] {
            StationOutcome::Failed(failure) => {
                assert_eq!(failure.gauge_id.as_deref(), Some("gone"));
                assert_eq!(failure.path, missing);
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
