//! File discovery module for gauge record directories
//!
//! Expands the configured glob pattern under the input directory and
//! returns station files in a stable order, skipping zero-byte files.

use crate::error::{GaugeError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File discovery component for station record directories
#[derive(Debug)]
pub struct FileDiscovery {
    input_dir: PathBuf,
    pattern: String,
    skip_empty_files: bool,
    empty_files: usize,
}

impl FileDiscovery {
    /// Create a new file discovery instance
    pub fn new(input_dir: PathBuf, pattern: impl Into<String>) -> Self {
        Self {
            input_dir,
            pattern: pattern.into(),
            skip_empty_files: true,
            empty_files: 0,
        }
    }

    /// Keep zero-byte files in the result
    pub fn include_empty_files(mut self) -> Self {
        self.skip_empty_files = false;
        self
    }

    /// Number of zero-byte files skipped by the last discovery
    pub fn empty_files(&self) -> usize {
        self.empty_files
    }

    /// Discover station files matching the pattern, sorted by path
    ///
    /// Layouts are free-form; for example with the default `**/*.csv`:
    /// ```text
    /// input/
    ///   Observed_Data/
    ///     peru_001.csv
    ///     peru_002.csv
    ///   extra/
    ///     chile_17.csv
    /// ```
    pub async fn discover_station_files(&mut self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(GaugeError::InputNotFound {
                path: self.input_dir.clone(),
            });
        }

        let input_dir = self.input_dir.clone();
        let pattern = self.pattern.clone();
        let skip_empty = self.skip_empty_files;

        let (files, empty) =
            tokio::task::spawn_blocking(move || expand_pattern(&input_dir, &pattern, skip_empty))
                .await
                .map_err(|e| GaugeError::ProcessingFailed {
                    path: self.input_dir.clone(),
                    reason: format!("Discovery task failed: {}", e),
                })??;

        self.empty_files = empty;
        debug!(
            "Found {} station files under {} ({} empty skipped)",
            files.len(),
            self.input_dir.display(),
            empty
        );

        Ok(files)
    }
}

fn expand_pattern(
    input_dir: &Path,
    pattern: &str,
    skip_empty: bool,
) -> Result<(Vec<PathBuf>, usize)> {
    let full_pattern = input_dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();
    debug!("Expanding glob pattern: {}", full_pattern);

    let paths = glob::glob(&full_pattern).map_err(|e| GaugeError::Configuration {
        message: format!("Invalid file pattern '{}': {}", pattern, e),
    })?;

    let mut files = Vec::new();
    let mut empty = 0usize;

    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable path {}: {}", e.path().display(), e);
                continue;
            }
        };

        if !path.is_file() {
            continue;
        }

        if skip_empty && std::fs::metadata(&path)?.len() == 0 {
            debug!("Skipping empty file: {}", path.display());
            empty += 1;
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok((files, empty))
}
