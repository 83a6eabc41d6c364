//! Station time series loading and cleaning.
//!
//! A station file is a delimited table whose first column holds timestamps
//! and whose remaining columns are measurement channels. [`RawSeries`] keeps
//! the table as read; [`RawSeries::clean`] applies the cleaning rules and
//! yields a [`CleanedSeries`] with parsed timestamps and complete rows.

use crate::config::StatsConfig;
use crate::constants::{DATE_FORMATS, DATETIME_FORMATS, MISSING_VALUE_MARKERS};
use crate::error::{GaugeError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One measurement channel as read from the station file
#[derive(Debug, Clone, PartialEq)]
pub struct RawChannel {
    pub name: String,
    pub values: Vec<Option<f64>>,
    /// Cells that held text which could not be read as a number.
    /// Missing markers and non-finite numbers are missing, not non-numeric.
    pub non_numeric: usize,
}

impl RawChannel {
    /// Build a channel of numeric cells
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
            non_numeric: 0,
        }
    }

    fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Station table as read, before any cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    /// Where the table came from, used in error messages
    pub source: PathBuf,
    /// Timestamp text per row; `None` when the cell was empty
    pub timestamps: Vec<Option<String>>,
    pub channels: Vec<RawChannel>,
}

/// Station table after cleaning: no missing values, parsed timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub channels: Vec<(String, Vec<f64>)>,
}

impl CleanedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.channels.is_empty()
    }
}

impl RawSeries {
    /// Build a series from in-memory rows
    pub fn new(timestamps: Vec<Option<String>>, channels: Vec<RawChannel>) -> Result<Self> {
        let source = PathBuf::from("<memory>");
        for channel in &channels {
            if channel.values.len() != timestamps.len() {
                return Err(GaugeError::InvalidFormat {
                    path: source,
                    reason: format!(
                        "channel '{}' has {} values for {} timestamps",
                        channel.name,
                        channel.values.len(),
                        timestamps.len()
                    ),
                });
            }
        }
        Ok(Self {
            source,
            timestamps,
            channels,
        })
    }

    /// Attach a source label used in error messages
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Number of rows as read
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Read a station file from disk
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, path)
    }

    /// Read a station table from any reader; `source` labels errors
    pub fn from_csv_reader<R: Read>(mut reader: R, source: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(GaugeError::InvalidFormat {
                path: source.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        let null_values = NullValues::AllColumns(
            MISSING_VALUE_MARKERS
                .iter()
                .copied()
                .map(PlSmallStr::from_static)
                .collect(),
        );
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|options| options.with_null_values(Some(null_values.clone())))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        Self::from_dataframe(&df, source)
    }

    /// Split a loaded frame into the timestamp column and measurement channels
    pub fn from_dataframe(df: &DataFrame, source: &Path) -> Result<Self> {
        let columns = df.get_columns();
        let Some((index_column, value_columns)) = columns.split_first() else {
            return Err(GaugeError::InvalidFormat {
                path: source.to_path_buf(),
                reason: "no columns found".to_string(),
            });
        };

        let index = index_column
            .as_materialized_series()
            .cast(&DataType::String)?;
        let timestamps: Vec<Option<String>> = index
            .str()?
            .into_iter()
            .map(|value| value.map(|text| text.trim().to_string()))
            .collect();

        let mut channels = Vec::with_capacity(value_columns.len());
        for column in value_columns {
            channels.push(read_channel(column.as_materialized_series())?);
        }

        debug!(
            "Read {} rows and {} channels from {}",
            timestamps.len(),
            channels.len(),
            source.display()
        );

        Ok(Self {
            source: source.to_path_buf(),
            timestamps,
            channels,
        })
    }

    /// Apply the cleaning rules in order:
    /// non-numeric scoping, empty-channel removal, incomplete-row removal,
    /// negative-row removal, then timestamp parsing of the surviving rows.
    pub fn clean(&self, config: &StatsConfig) -> Result<CleanedSeries> {
        let mut channels: Vec<&RawChannel> = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            if channel.non_numeric > 0 {
                if config.numeric_only {
                    debug!(
                        "Excluding non-numeric column '{}' from {}",
                        channel.name,
                        self.source.display()
                    );
                    continue;
                }
                return Err(GaugeError::InvalidFormat {
                    path: self.source.clone(),
                    reason: format!(
                        "column '{}' has {} non-numeric values",
                        channel.name, channel.non_numeric
                    ),
                });
            }
            if channel.is_all_missing() {
                debug!(
                    "Dropping empty column '{}' from {}",
                    channel.name,
                    self.source.display()
                );
                continue;
            }
            channels.push(channel);
        }

        if channels.is_empty() {
            return Ok(CleanedSeries {
                timestamps: Vec::new(),
                channels: Vec::new(),
            });
        }

        let kept_rows: Vec<usize> = (0..self.len())
            .filter(|&row| channels.iter().all(|c| c.values[row].is_some()))
            .filter(|&row| {
                !config.drop_negative
                    || channels
                        .iter()
                        .all(|c| c.values[row].is_some_and(|v| v >= 0.0))
            })
            .collect();

        let mut timestamps = Vec::with_capacity(kept_rows.len());
        for &row in &kept_rows {
            let text = self.timestamps[row].as_deref().unwrap_or("");
            let parsed = parse_timestamp(text).ok_or_else(|| GaugeError::TimestampParse {
                path: self.source.clone(),
                row: row + 1,
                value: text.to_string(),
            })?;
            timestamps.push(parsed);
        }

        let channels = channels
            .into_iter()
            .map(|channel| {
                let values = kept_rows
                    .iter()
                    .filter_map(|&row| channel.values[row])
                    .collect();
                (channel.name.clone(), values)
            })
            .collect();

        Ok(CleanedSeries {
            timestamps,
            channels,
        })
    }
}

fn read_channel(series: &Series) -> Result<RawChannel> {
    let name = series.name().to_string();

    let (values, non_numeric) = match series.dtype() {
        DataType::String => {
            let mut non_numeric = 0;
            let values = series
                .str()?
                .into_iter()
                .map(|cell| {
                    let text = cell?.trim();
                    if text.is_empty() || MISSING_VALUE_MARKERS.contains(&text) {
                        return None;
                    }
                    match text.parse::<f64>() {
                        Ok(value) => Some(value).filter(|v| v.is_finite()),
                        Err(_) => {
                            non_numeric += 1;
                            None
                        }
                    }
                })
                .collect();
            (values, non_numeric)
        }
        DataType::Null => (vec![None; series.len()], 0),
        dtype if dtype.is_primitive_numeric() => {
            let cast = series.cast(&DataType::Float64)?;
            let values = cast
                .f64()?
                .into_iter()
                .map(|value| value.filter(|v| v.is_finite()))
                .collect();
            (values, 0)
        }
        _ => {
            let present = series.len() - series.null_count();
            (vec![None; series.len()], present)
        }
    };

    Ok(RawChannel {
        name,
        values,
        non_numeric,
    })
}

/// Parse a timestamp cell in any of the accepted layouts
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
