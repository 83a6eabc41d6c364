//! Command-line interface components.

use crate::config::{GapDefinition, GaugeConfig, OutputFormat};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "gauge_stats")]
#[command(about = "Summarise stream gauge discharge records into one statistics table")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory holding one record file per gauge
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Summary file to write (default: gauge_summary.<format> next to INPUT_DIR)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob pattern for station files, relative to INPUT_DIR
    #[arg(long)]
    pub pattern: Option<String>,

    /// Keep negative readings instead of dropping their rows
    #[arg(long)]
    pub keep_negative: bool,

    /// How gaps in a record are counted
    #[arg(long, value_enum)]
    pub gap_definition: Option<GapDefinition>,

    /// Whole days between observations above which a gap is counted
    #[arg(long)]
    pub gap_threshold_days: Option<i64>,

    /// Reject files with non-numeric columns instead of ignoring those columns
    #[arg(long)]
    pub include_non_numeric: bool,

    /// Summary file format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of stations computed concurrently (default: number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// TOML configuration file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write histogram and boxplot data under this directory
    #[arg(long, value_name = "DIR")]
    pub distributions: Option<PathBuf>,

    /// Fail when two files map to the same gauge identifier
    #[arg(long)]
    pub fail_on_duplicate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Build the run configuration: defaults, then the optional config file,
    /// then explicit flags.
    pub fn to_config(&self) -> Result<GaugeConfig> {
        let base = match &self.config {
            Some(path) => GaugeConfig::from_toml_file(path)?,
            None => GaugeConfig::default(),
        };
        let config = self.apply_overrides(base);
        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    fn apply_overrides(&self, mut config: GaugeConfig) -> GaugeConfig {
        if let Some(pattern) = &self.pattern {
            config.file_pattern = pattern.clone();
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(workers) = self.workers {
            config.max_concurrent_files = workers;
        }
        if self.fail_on_duplicate {
            config.fail_on_duplicate_gauge = true;
        }
        if self.keep_negative {
            config.stats.drop_negative = false;
        }
        if self.include_non_numeric {
            config.stats.numeric_only = false;
        }
        if let Some(gap_definition) = self.gap_definition {
            config.stats.gap_definition = gap_definition;
        }
        if let Some(days) = self.gap_threshold_days {
            config.stats.gap_threshold_days = days;
        }
        config
    }
}

/// Set up structured logging
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gauge_stats={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
