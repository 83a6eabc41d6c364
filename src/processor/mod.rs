//! Batch processing engine.
//!
//! Orchestrates a full run over a directory of station files: discovery,
//! concurrent per-station statistics, aggregation into one summary table,
//! writing, and the optional distribution export.

pub mod discovery;
pub mod pipeline;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::FileDiscovery, pipeline::StationPipeline, writer::SummaryWriter};

use crate::config::GaugeConfig;
use crate::constants::DEFAULT_SUMMARY_FILE;
use crate::distribution::DistributionReport;
use crate::error::{GaugeError, Result};
use crate::models::{ProcessingStats, StationOutcome};
use crate::summary::{SummaryAggregator, SummaryTable};

use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Main processor for a directory of station records
#[derive(Debug)]
pub struct GaugeProcessor {
    input_dir: PathBuf,
    output_path: PathBuf,
    distribution_dir: Option<PathBuf>,
    config: GaugeConfig,
    show_progress: bool,
}

impl GaugeProcessor {
    /// Create a new processor; the summary defaults to
    /// `gauge_summary.<ext>` next to the input directory
    pub fn new(input_dir: PathBuf, output_path: Option<PathBuf>) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(GaugeError::InputNotFound { path: input_dir });
        }

        let config = GaugeConfig::default();
        let output_path = output_path.unwrap_or_else(|| default_output_path(&input_dir, &config));

        Ok(Self {
            input_dir,
            output_path,
            distribution_dir: None,
            config,
            show_progress: true,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: GaugeConfig) -> Self {
        if self.output_path == default_output_path(&self.input_dir, &self.config) {
            self.output_path = default_output_path(&self.input_dir, &config);
        }
        self.config = config;
        self
    }

    /// Also export histogram and boxplot data under `dir`
    pub fn with_distribution_dir(mut self, dir: PathBuf) -> Self {
        self.distribution_dir = Some(dir);
        self
    }

    /// Hide progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Main processing entry point
    pub async fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting gauge statistics run".bright_green().bold());
        println!("  {} {}", "Input:".bright_cyan(), self.input_dir.display());
        println!("  {} {}", "Output:".bright_cyan(), self.output_path.display());

        // Step 1: Discover station files
        println!("\n{}", "Discovering station files...".bright_yellow());
        let mut discovery = FileDiscovery::new(self.input_dir.clone(), &self.config.file_pattern);
        if !self.config.skip_empty_files {
            discovery = discovery.include_empty_files();
        }
        let mut files = discovery.discover_station_files().await?;
        // a previous summary written inside the input tree is not a station
        files.retain(|file| file != &self.output_path);
        println!(
            "  {} {} station files ({} empty skipped)",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold(),
            discovery.empty_files()
        );

        let mut stats = ProcessingStats {
            files_discovered: files.len() + discovery.empty_files(),
            files_empty: discovery.empty_files(),
            output_path: self.output_path.clone(),
            ..Default::default()
        };

        // Step 2: Compute stations concurrently, outcomes in discovery order
        println!("\n{}", "Computing station statistics...".bright_yellow());
        let mut pipeline = StationPipeline::new(&self.config);
        if !self.show_progress {
            pipeline = pipeline.without_progress();
        }
        let outcomes = pipeline.run(&files).await?;

        let mut summaries = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                StationOutcome::Summary(summary) => {
                    stats.files_processed += 1;
                    summaries.push(Some(summary));
                }
                StationOutcome::NoData { .. } => stats.files_no_data += 1,
                StationOutcome::Failed(failure) => {
                    stats.files_failed += 1;
                    stats.failures.push(failure);
                }
            }
        }

        // Step 3: Aggregate
        let table = SummaryAggregator::aggregate(summaries);
        stats.duplicate_gauges = table.duplicates().to_vec();
        if !table.duplicates().is_empty() {
            warn!(
                "{} gauge identifiers appeared more than once",
                table.duplicates().len()
            );
            if self.config.fail_on_duplicate_gauge {
                table.ensure_unique()?;
            }
        }

        // Step 4: Write the summary table
        let writer = SummaryWriter::new(self.output_path.clone(), self.config.output_format)
            .with_compression(self.config.compression);
        stats.stations_written = self.write_table(writer, &table).await?;
        info!(
            "Wrote {} stations to {}",
            stats.stations_written,
            self.output_path.display()
        );

        // Step 5: Distribution export
        if let Some(dir) = &self.distribution_dir {
            let written = self.export_distributions(dir.clone(), table).await?;
            println!(
                "  {} {} distribution files under {}",
                "Exported".bright_green(),
                written,
                dir.display()
            );
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        print_summary(&stats);
        Ok(stats)
    }

    async fn write_table(&self, writer: SummaryWriter, table: &SummaryTable) -> Result<usize> {
        let table = table.clone();
        tokio::task::spawn_blocking(move || writer.write(&table))
            .await
            .map_err(|e| GaugeError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Writer task failed: {}", e),
            })?
    }

    async fn export_distributions(&self, dir: PathBuf, table: SummaryTable) -> Result<usize> {
        let target = dir.clone();
        let written = tokio::task::spawn_blocking(move || {
            DistributionReport::from_table(&table).write_csv(&target)
        })
        .await
        .map_err(|e| GaugeError::ProcessingFailed {
            path: dir,
            reason: format!("Distribution export task failed: {}", e),
        })??;
        Ok(written.len())
    }
}

fn default_output_path(input_dir: &Path, config: &GaugeConfig) -> PathBuf {
    input_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULT_SUMMARY_FILE)
        .with_extension(config.output_format.extension())
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_no_data > 0 || stats.files_empty > 0 {
        println!(
            "  {} {} ({} empty files)",
            "No usable data:".bright_yellow(),
            stats.files_no_data.to_string().bright_yellow(),
            stats.files_empty
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
        for failure in &stats.failures {
            println!("    {} {}", failure.path.display(), failure.reason.bright_black());
        }
    }
    if !stats.duplicate_gauges.is_empty() {
        println!(
            "  {} {}",
            "Duplicate gauge ids:".bright_red(),
            stats.duplicate_gauges.join(", ").bright_red()
        );
    }
    println!(
        "  {} {}",
        "Stations written:".bright_cyan(),
        stats.stations_written.to_string().bright_white().bold()
    );
}
