//! Application constants for the gauge statistics pipeline
//!
//! Column names, default thresholds and file layout values shared by the
//! calculator, the aggregator and the writers.

// =============================================================================
// Summary Table Layout
// =============================================================================

/// Identifier column of the summary table
pub const GAUGE_ID_COLUMN: &str = "gauge_id";

/// Per-channel statistics that precede the monthly counts, in output order
pub const LEADING_CHANNEL_STATS: &[&str] = &[
    "mean", "median", "min", "q1", "q3", "max", "skew", "stdev", "n",
];

/// Monthly coverage columns, January first
pub const MONTH_COLUMNS: [&str; 12] = [
    "n_jan", "n_feb", "n_mar", "n_apr", "n_may", "n_jun", "n_jul", "n_aug", "n_sep", "n_oct",
    "n_nov", "n_dec",
];

pub const N_GAPS_COLUMN: &str = "n_gaps";
pub const LAST_OBS_COLUMN: &str = "last_obs";
pub const FIRST_YEAR_COLUMN: &str = "first_year";
pub const LAST_YEAR_COLUMN: &str = "last_year";

/// Per-channel statistic written after the station-level columns
pub const YEARLY_AVG_COLUMN: &str = "yearly_avg";

/// Layout used when writing `last_obs` into CSV output
pub const LAST_OBS_CSV_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Statistics Defaults
// =============================================================================

/// Successive observations further apart than this many whole days form a gap
pub const DEFAULT_GAP_THRESHOLD_DAYS: i64 = 31;

/// Quantile fractions for the lower and upper quartiles
pub const Q1_FRACTION: f64 = 0.25;
pub const Q3_FRACTION: f64 = 0.75;

// =============================================================================
// Input Discovery
// =============================================================================

/// Default glob pattern, relative to the input directory
pub const DEFAULT_FILE_PATTERN: &str = "**/*.csv";

/// Default summary file name when no output path is given
pub const DEFAULT_SUMMARY_FILE: &str = "gauge_summary.csv";

/// Cell text read as a missing value, alongside empty cells
pub const MISSING_VALUE_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Timestamp layouts tried in order for naive date-times
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Timestamp layouts tried in order for plain dates
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// =============================================================================
// Distribution Export
// =============================================================================

/// Box whisker reach as a multiple of the interquartile range
pub const OUTLIER_IQR_MULTIPLIER: f64 = 1.5;

/// Number of equal-width histogram bins
pub const HISTOGRAM_BINS: usize = 10;

pub const HISTOGRAMS_WITH_OUTLIERS_DIR: &str = "histograms_with_outliers";
pub const HISTOGRAMS_WITHOUT_OUTLIERS_DIR: &str = "histograms_without_outliers";
pub const BOXPLOTS_WITH_OUTLIERS_DIR: &str = "boxplots_with_outliers";
pub const BOXPLOTS_WITHOUT_OUTLIERS_DIR: &str = "boxplots_without_outliers";
