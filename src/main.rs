use anyhow::{Context, Result};
use clap::Parser;
use gauge_stats::GaugeProcessor;
use gauge_stats::cli::{Args, setup_logging};
use gauge_stats::models::ProcessingStats;
use std::process;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to install CTRL+C signal handler")?;
                eprintln!("\nReceived CTRL+C, shutting down...");
                anyhow::bail!("Processing interrupted by user")
            }
        }
    });

    match result {
        Ok(_stats) => {
            // Success - stats have already been reported by the processor
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<ProcessingStats> {
    let config = args.to_config().context("Invalid configuration")?;

    let mut processor = GaugeProcessor::new(args.input_dir.clone(), args.output.clone())
        .with_context(|| format!("Cannot process {}", args.input_dir.display()))?
        .with_config(config);
    if let Some(dir) = &args.distributions {
        processor = processor.with_distribution_dir(dir.clone());
    }
    if args.quiet {
        processor = processor.without_progress();
    }

    let stats = processor.process().await?;
    Ok(stats)
}
