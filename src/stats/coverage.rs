//! Temporal coverage of a station record.
//!
//! Observation density per calendar month, gap counting and the span of
//! years a station has reported.

use crate::config::GapDefinition;
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeSet;

/// Coverage figures shared by every channel of a station
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    /// Observations per calendar month, January first, across all years
    pub monthly_counts: [u64; 12],
    pub n_gaps: u64,
    pub last_obs: NaiveDateTime,
    pub first_year: i32,
    pub last_year: i32,
    pub distinct_years: usize,
}

impl Coverage {
    /// Compute coverage for a non-empty set of timestamps
    pub fn from_timestamps(
        timestamps: &[NaiveDateTime],
        gap_definition: GapDefinition,
        gap_threshold_days: i64,
    ) -> Option<Self> {
        let mut sorted = timestamps.to_vec();
        sorted.sort();
        let first = *sorted.first()?;
        let last = *sorted.last()?;

        let years: BTreeSet<i32> = sorted.iter().map(|ts| ts.year()).collect();

        let n_gaps = match gap_definition {
            GapDefinition::SuccessiveDiff => successive_gaps(&sorted, gap_threshold_days),
            GapDefinition::MonthlyResample => empty_months(&sorted),
        };

        Some(Self {
            monthly_counts: monthly_counts(&sorted),
            n_gaps,
            last_obs: last,
            first_year: first.year(),
            last_year: last.year(),
            distinct_years: years.len(),
        })
    }
}

/// Histogram of observations by month of year
pub fn monthly_counts(timestamps: &[NaiveDateTime]) -> [u64; 12] {
    let mut counts = [0u64; 12];
    for ts in timestamps {
        counts[ts.month0() as usize] += 1;
    }
    counts
}

/// Successive differences of sorted timestamps whose whole-day part
/// exceeds `threshold_days`.
pub fn successive_gaps(sorted: &[NaiveDateTime], threshold_days: i64) -> u64 {
    sorted
        .windows(2)
        .filter(|pair| (pair[1] - pair[0]).num_days() > threshold_days)
        .count() as u64
}

/// Calendar months between the first and last observed month (inclusive)
/// that hold no observation.
pub fn empty_months(sorted: &[NaiveDateTime]) -> u64 {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return 0;
    };

    let observed: BTreeSet<i64> = sorted.iter().map(month_index).collect();
    let span = month_index(last) - month_index(first) + 1;

    (span - observed.len() as i64).max(0) as u64
}

fn month_index(ts: &NaiveDateTime) -> i64 {
    ts.year() as i64 * 12 + ts.month0() as i64
}
