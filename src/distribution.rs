//! Distribution data for summary table columns.
//!
//! Prepares what a plotting front end needs to draw a histogram and a
//! boxplot per summary column, with and without outliers. Outliers follow
//! the 1.5 x IQR rule. Each export call takes its own output directory;
//! nothing is drawn here.

use crate::constants::{
    BOXPLOTS_WITHOUT_OUTLIERS_DIR, BOXPLOTS_WITH_OUTLIERS_DIR, HISTOGRAMS_WITHOUT_OUTLIERS_DIR,
    HISTOGRAMS_WITH_OUTLIERS_DIR, HISTOGRAM_BINS, OUTLIER_IQR_MULTIPLIER, Q1_FRACTION, Q3_FRACTION,
};
use crate::error::Result;
use crate::stats::descriptive::quantile_sorted;
use crate::summary::SummaryTable;

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Values strictly inside `(q1 - 1.5 IQR, q3 + 1.5 IQR)`, in input order
pub fn filter_outliers(values: &[f64]) -> Vec<f64> {
    let sorted = sorted_copy(values);
    let (Some(q1), Some(q3)) = (
        quantile_sorted(&sorted, Q1_FRACTION),
        quantile_sorted(&sorted, Q3_FRACTION),
    ) else {
        return Vec::new();
    };
    let reach = OUTLIER_IQR_MULTIPLIER * (q3 - q1);
    values
        .iter()
        .copied()
        .filter(|&v| v > q1 - reach && v < q3 + reach)
        .collect()
}

/// One histogram bin; `upper` is exclusive except for the last bin
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Equal-width histogram over `[min, max]`
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn from_values(values: &[f64], bin_count: usize) -> Self {
        let (Some(min), Some(max)) = (
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        ) else {
            return Self { bins: Vec::new() };
        };

        if bin_count == 0 {
            return Self { bins: Vec::new() };
        }

        if min == max {
            return Self {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: max,
                    count: values.len() as u64,
                }],
            };
        }

        let width = (max - min) / bin_count as f64;
        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == bin_count {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &value in values {
            let index = (((value - min) / width) as usize).min(bin_count - 1);
            bins[index].count += 1;
        }

        Self { bins }
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Five-number box summary with 1.5 x IQR whiskers
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: u64,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        let q1 = quantile_sorted(&sorted, Q1_FRACTION)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, Q3_FRACTION)?;
        let reach = OUTLIER_IQR_MULTIPLIER * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|&v| v >= low_fence && v <= high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers: (sorted.len() - inside.len()) as u64,
        })
    }
}

/// Histogram and box data for one column, one outlier policy
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDistribution {
    pub column: String,
    pub include_outliers: bool,
    pub histogram: Histogram,
    pub boxplot: Option<BoxSummary>,
}

impl ColumnDistribution {
    pub fn new(column: &str, values: &[f64], include_outliers: bool) -> Self {
        let values = if include_outliers {
            values.to_vec()
        } else {
            filter_outliers(values)
        };
        Self {
            column: column.to_string(),
            include_outliers,
            histogram: Histogram::from_values(&values, HISTOGRAM_BINS),
            boxplot: BoxSummary::from_values(&values),
        }
    }

    fn histogram_frame(&self) -> Result<DataFrame> {
        let lower: Vec<f64> = self.histogram.bins.iter().map(|b| b.lower).collect();
        let upper: Vec<f64> = self.histogram.bins.iter().map(|b| b.upper).collect();
        let count: Vec<u64> = self.histogram.bins.iter().map(|b| b.count).collect();
        Ok(DataFrame::new(vec![
            Column::new("bin_lower".into(), lower),
            Column::new("bin_upper".into(), upper),
            Column::new("count".into(), count),
        ])?)
    }

    fn boxplot_frame(&self) -> Result<DataFrame> {
        let b = self.boxplot.as_ref();
        Ok(DataFrame::new(vec![
            Column::new("q1".into(), vec![b.map(|b| b.q1)]),
            Column::new("median".into(), vec![b.map(|b| b.median)]),
            Column::new("q3".into(), vec![b.map(|b| b.q3)]),
            Column::new("whisker_low".into(), vec![b.map(|b| b.whisker_low)]),
            Column::new("whisker_high".into(), vec![b.map(|b| b.whisker_high)]),
            Column::new("outliers".into(), vec![b.map(|b| b.outliers)]),
        ])?)
    }
}

/// Distribution data for every numeric column of a summary table
#[derive(Debug, Clone, Default)]
pub struct DistributionReport {
    pub columns: Vec<ColumnDistribution>,
}

impl DistributionReport {
    pub fn from_table(table: &SummaryTable) -> Self {
        let mut columns = Vec::new();
        for (name, values) in table.numeric_columns() {
            columns.push(ColumnDistribution::new(&name, &values, true));
            columns.push(ColumnDistribution::new(&name, &values, false));
        }
        Self { columns }
    }

    /// Write every histogram and box summary as CSV under `root`, in the
    /// four category directories; returns the files written.
    pub fn write_csv(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for distribution in &self.columns {
            let (histogram_dir, boxplot_dir) = if distribution.include_outliers {
                (HISTOGRAMS_WITH_OUTLIERS_DIR, BOXPLOTS_WITH_OUTLIERS_DIR)
            } else {
                (HISTOGRAMS_WITHOUT_OUTLIERS_DIR, BOXPLOTS_WITHOUT_OUTLIERS_DIR)
            };

            let stem = file_stem(&distribution.column);
            let histogram_path = root
                .join(histogram_dir)
                .join(format!("{}_histogram.csv", stem));
            write_frame(&mut distribution.histogram_frame()?, &histogram_path)?;
            written.push(histogram_path);

            let boxplot_path = root
                .join(boxplot_dir)
                .join(format!("{}_boxplot.csv", stem));
            write_frame(&mut distribution.boxplot_frame()?, &boxplot_path)?;
            written.push(boxplot_path);
        }

        debug!(
            "Wrote {} distribution files under {}",
            written.len(),
            root.display()
        );
        Ok(written)
    }
}

/// Column name made safe for use as a single file name
fn file_stem(column: &str) -> String {
    column
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_filter_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        // q1 = 2.25, q3 = 4.75, fences at -1.5 and 8.5
        assert_eq!(filter_outliers(&values), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(filter_outliers(&[]).is_empty());
    }

    #[test]
    fn test_filter_outliers_constant_column_is_empty() {
        // zero IQR leaves an empty open interval
        assert!(filter_outliers(&[3.0, 3.0, 3.0]).is_empty());
    }

    #[test]
    fn test_histogram_bins() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let histogram = Histogram::from_values(&values, 10);
        assert_eq!(histogram.bins.len(), 10);
        assert_eq!(histogram.total(), 11);
        // the maximum falls in the closed last bin
        assert_eq!(histogram.bins[9].count, 2);
        assert_eq!(histogram.bins[0].lower, 0.0);
        assert_eq!(histogram.bins[9].upper, 10.0);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let constant = Histogram::from_values(&[2.0, 2.0], 10);
        assert_eq!(constant.bins.len(), 1);
        assert_eq!(constant.total(), 2);

        assert!(Histogram::from_values(&[], 10).bins.is_empty());
    }

    #[test]
    fn test_box_summary() {
        let summary = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.5);
        assert_eq!(summary.whisker_low, 1.0);
        assert_eq!(summary.whisker_high, 5.0);
        assert_eq!(summary.outliers, 1);
        assert!(BoxSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_column_distribution_policies() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let with = ColumnDistribution::new("mean", &values, true);
        let without = ColumnDistribution::new("mean", &values, false);
        assert_eq!(with.histogram.total(), 6);
        assert_eq!(without.histogram.total(), 5);
        assert_eq!(without.boxplot.unwrap().outliers, 0);
    }

    #[test]
    fn test_report_writes_category_directories() {
        let temp_dir = TempDir::new().unwrap();
        let report = DistributionReport {
            columns: vec![
                ColumnDistribution::new("mean", &[1.0, 2.0, 3.0], true),
                ColumnDistribution::new("mean", &[1.0, 2.0, 3.0], false),
            ],
        };

        let written = report.write_csv(temp_dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        assert!(
            temp_dir
                .path()
                .join("histograms_with_outliers/mean_histogram.csv")
                .exists()
        );
        assert!(
            temp_dir
                .path()
                .join("boxplots_without_outliers/mean_boxplot.csv")
                .exists()
        );

        let contents = std::fs::read_to_string(
            temp_dir
                .path()
                .join("histograms_with_outliers/mean_histogram.csv"),
        )
        .unwrap();
        assert!(contents.starts_with("bin_lower,bin_upper,count"));
    }

    #[test]
    fn test_column_with_path_separator_writes_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let report = DistributionReport {
            columns: vec![ColumnDistribution::new(
                "mean_Discharge (m3/s)",
                &[1.0, 2.0],
                true,
            )],
        };

        let written = report.write_csv(temp_dir.path()).unwrap();
        let histogram = temp_dir
            .path()
            .join("histograms_with_outliers/mean_Discharge (m3_s)_histogram.csv");
        assert!(histogram.exists());
        assert!(written.contains(&histogram));
        for path in &written {
            assert_eq!(path.parent().unwrap().parent().unwrap(), temp_dir.path());
        }
    }
}
