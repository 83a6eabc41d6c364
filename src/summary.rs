//! Aggregation of station summaries into one table.
//!
//! [`SummaryAggregator`] folds per-station results, skipping stations that
//! produced nothing, and sorts the rows by `gauge_id`. The resulting
//! [`SummaryTable`] renders to a polars `DataFrame` with the fixed column
//! layout consumed by the writers and the distribution export.

use crate::constants::{
    FIRST_YEAR_COLUMN, GAUGE_ID_COLUMN, LAST_OBS_COLUMN, LAST_YEAR_COLUMN, LEADING_CHANNEL_STATS,
    MONTH_COLUMNS, N_GAPS_COLUMN, YEARLY_AVG_COLUMN,
};
use crate::error::{GaugeError, Result};
use crate::stats::{ChannelStats, StationSummary};

use chrono::Datelike;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Folds station summaries into a sorted table
#[derive(Debug, Default)]
pub struct SummaryAggregator;

impl SummaryAggregator {
    /// Merge `rows` in order, skipping `None`; a repeated `gauge_id`
    /// replaces the earlier row and is recorded as a duplicate.
    pub fn aggregate<I>(rows: I) -> SummaryTable
    where
        I: IntoIterator<Item = Option<StationSummary>>,
    {
        let mut merged: Vec<StationSummary> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut duplicates: Vec<String> = Vec::new();

        for summary in rows.into_iter().flatten() {
            match positions.get(&summary.gauge_id) {
                Some(&index) => {
                    warn!(
                        "Duplicate gauge_id '{}', replacing the earlier summary",
                        summary.gauge_id
                    );
                    if !duplicates.contains(&summary.gauge_id) {
                        duplicates.push(summary.gauge_id.clone());
                    }
                    merged[index] = summary;
                }
                None => {
                    positions.insert(summary.gauge_id.clone(), merged.len());
                    merged.push(summary);
                }
            }
        }

        merged.sort_by(|a, b| a.gauge_id.cmp(&b.gauge_id));
        duplicates.sort();

        debug!(
            "Aggregated {} stations ({} duplicate identifiers)",
            merged.len(),
            duplicates.len()
        );

        SummaryTable {
            rows: merged,
            duplicates,
        }
    }
}

/// Station summaries sorted ascending by `gauge_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    rows: Vec<StationSummary>,
    duplicates: Vec<String>,
}

/// Per-channel statistic accessor used to lay out table columns
type ChannelField = fn(&ChannelStats) -> Option<f64>;

fn leading_field(name: &str) -> Option<ChannelField> {
    let field: ChannelField = match name {
        "mean" => |c: &ChannelStats| Some(c.mean),
        "median" => |c: &ChannelStats| Some(c.median),
        "min" => |c: &ChannelStats| Some(c.min),
        "q1" => |c: &ChannelStats| Some(c.q1),
        "q3" => |c: &ChannelStats| Some(c.q3),
        "max" => |c: &ChannelStats| Some(c.max),
        "skew" => |c: &ChannelStats| c.skew,
        "stdev" => |c: &ChannelStats| c.stdev,
        _ => return None,
    };
    Some(field)
}

impl SummaryTable {
    pub fn rows(&self) -> &[StationSummary] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers that appeared more than once during aggregation
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Fail if aggregation saw any repeated identifier
    pub fn ensure_unique(&self) -> Result<()> {
        if self.duplicates.is_empty() {
            Ok(())
        } else {
            Err(GaugeError::DuplicateGauge {
                gauge_ids: self.duplicates.clone(),
            })
        }
    }

    /// Row for a gauge identifier
    pub fn get(&self, gauge_id: &str) -> Option<&StationSummary> {
        self.rows
            .binary_search_by(|row| row.gauge_id.as_str().cmp(gauge_id))
            .ok()
            .map(|index| &self.rows[index])
    }

    /// Distinct channel names in first-seen order
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for channel in &row.channels {
                if !names.contains(&channel.channel) {
                    names.push(channel.channel.clone());
                }
            }
        }
        names
    }

    /// Per-channel column groups. `None` stands for each row's only channel
    /// and yields plain column names; named groups are used once any station
    /// reports more than one channel.
    fn channel_slots(&self) -> Vec<Option<String>> {
        if self.rows.iter().all(|row| row.channels.len() <= 1) {
            vec![None]
        } else {
            self.channel_names().into_iter().map(Some).collect()
        }
    }

    fn column_name(stat: &str, slot: Option<&str>) -> String {
        match slot {
            Some(channel) => format!("{}_{}", stat, channel),
            None => stat.to_string(),
        }
    }

    fn slot_channel<'a>(
        row: &'a StationSummary,
        slot: Option<&str>,
    ) -> Option<&'a ChannelStats> {
        match slot {
            Some(channel) => row.channel(channel),
            None => row.primary(),
        }
    }

    fn channel_floats(&self, slot: Option<&str>, field: ChannelField) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| Self::slot_channel(row, slot).and_then(field))
            .collect()
    }

    fn channel_counts(&self, slot: Option<&str>) -> Vec<Option<u64>> {
        self.rows
            .iter()
            .map(|row| Self::slot_channel(row, slot).map(|c| c.n))
            .collect()
    }

    /// Render the table with its fixed column order:
    /// `gauge_id`, channel statistics through `n`, monthly counts, `n_gaps`,
    /// `last_obs`, `first_year`, `last_year`, then `yearly_avg`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let slots = self.channel_slots();
        let mut columns: Vec<Column> = Vec::new();

        let ids: Vec<&str> = self.rows.iter().map(|r| r.gauge_id.as_str()).collect();
        columns.push(Column::new(GAUGE_ID_COLUMN.into(), ids));

        for stat in LEADING_CHANNEL_STATS {
            for slot in slots.iter().map(Option::as_deref) {
                let name = Self::column_name(stat, slot);
                match leading_field(stat) {
                    Some(field) => {
                        columns.push(Column::new(
                            name.into(),
                            self.channel_floats(slot, field),
                        ));
                    }
                    None => {
                        columns.push(Column::new(name.into(), self.channel_counts(slot)));
                    }
                }
            }
        }

        for (month, name) in MONTH_COLUMNS.iter().enumerate() {
            let counts: Vec<u64> = self.rows.iter().map(|r| r.monthly_counts[month]).collect();
            columns.push(Column::new((*name).into(), counts));
        }

        let gaps: Vec<u64> = self.rows.iter().map(|r| r.n_gaps).collect();
        columns.push(Column::new(N_GAPS_COLUMN.into(), gaps));

        let last_obs: Vec<i64> = self
            .rows
            .iter()
            .map(|r| r.last_obs.and_utc().timestamp_millis())
            .collect();
        let last_obs = Series::new(LAST_OBS_COLUMN.into(), last_obs)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        columns.push(Column::from(last_obs));

        let first_years: Vec<i32> = self.rows.iter().map(|r| r.first_year).collect();
        columns.push(Column::new(FIRST_YEAR_COLUMN.into(), first_years));
        let last_years: Vec<i32> = self.rows.iter().map(|r| r.last_year).collect();
        columns.push(Column::new(LAST_YEAR_COLUMN.into(), last_years));

        for slot in slots.iter().map(Option::as_deref) {
            let name = Self::column_name(YEARLY_AVG_COLUMN, slot);
            columns.push(Column::new(
                name.into(),
                self.channel_floats(slot, |c: &ChannelStats| Some(c.yearly_avg)),
            ));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Every non-identifier column as plain numbers, in table order.
    ///
    /// `last_obs` is reduced to its calendar year; empty cells are omitted.
    pub fn numeric_columns(&self) -> Vec<(String, Vec<f64>)> {
        let slots = self.channel_slots();
        let mut out: Vec<(String, Vec<f64>)> = Vec::new();

        for stat in LEADING_CHANNEL_STATS {
            for slot in slots.iter().map(Option::as_deref) {
                let name = Self::column_name(stat, slot);
                let values = match leading_field(stat) {
                    Some(field) => self
                        .channel_floats(slot, field)
                        .into_iter()
                        .flatten()
                        .collect(),
                    None => self
                        .channel_counts(slot)
                        .into_iter()
                        .flatten()
                        .map(|n| n as f64)
                        .collect(),
                };
                out.push((name, values));
            }
        }

        for (month, name) in MONTH_COLUMNS.iter().enumerate() {
            let values = self.rows.iter().map(|r| r.monthly_counts[month] as f64).collect();
            out.push((name.to_string(), values));
        }

        out.push((
            N_GAPS_COLUMN.to_string(),
            self.rows.iter().map(|r| r.n_gaps as f64).collect(),
        ));
        out.push((
            LAST_OBS_COLUMN.to_string(),
            self.rows.iter().map(|r| r.last_obs.year() as f64).collect(),
        ));
        out.push((
            FIRST_YEAR_COLUMN.to_string(),
            self.rows.iter().map(|r| r.first_year as f64).collect(),
        ));
        out.push((
            LAST_YEAR_COLUMN.to_string(),
            self.rows.iter().map(|r| r.last_year as f64).collect(),
        ));

        for slot in slots.iter().map(Option::as_deref) {
            let name = Self::column_name(YEARLY_AVG_COLUMN, slot);
            let values = self
                .channel_floats(slot, |c: &ChannelStats| Some(c.yearly_avg))
                .into_iter()
                .flatten()
                .collect();
            out.push((name, values));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::parse_timestamp;

    fn channel(name: &str, mean: f64) -> ChannelStats {
        ChannelStats {
            channel: name.to_string(),
            mean,
            median: mean,
            min: mean - 1.0,
            q1: mean - 0.5,
            q3: mean + 0.5,
            max: mean + 1.0,
            skew: None,
            stdev: Some(0.5),
            n: 4,
            yearly_avg: 4.0,
        }
    }

    fn summary(gauge_id: &str, mean: f64) -> StationSummary {
        let mut monthly_counts = [0u64; 12];
        monthly_counts[0] = 4;
        StationSummary {
            gauge_id: gauge_id.to_string(),
            channels: vec![channel("discharge", mean)],
            monthly_counts,
            n_gaps: 0,
            last_obs: parse_timestamp("2021-01-31 06:00:00").unwrap(),
            first_year: 2021,
            last_year: 2021,
        }
    }

    #[test]
    fn test_reverse_order_is_sorted() {
        let table =
            SummaryAggregator::aggregate(vec![Some(summary("b", 1.0)), Some(summary("a", 2.0))]);
        let ids: Vec<&str> = table.rows().iter().map(|r| r.gauge_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_any_permutation_is_sorted() {
        let ids = ["peru_116", "chile_2", "peru_002", "argentina_9", "chile_10"];
        for rotation in 0..ids.len() {
            let mut order = ids.to_vec();
            order.rotate_left(rotation);
            order.reverse();
            let table =
                SummaryAggregator::aggregate(order.iter().map(|id| Some(summary(id, 1.0))));
            let sorted: Vec<&str> = table.rows().iter().map(|r| r.gauge_id.as_str()).collect();
            assert_eq!(
                sorted,
                vec!["argentina_9", "chile_10", "chile_2", "peru_002", "peru_116"]
            );
        }
    }

    #[test]
    fn test_none_results_are_skipped() {
        let table = SummaryAggregator::aggregate(vec![None, Some(summary("a", 1.0)), None]);
        assert_eq!(table.len(), 1);
        assert!(table.duplicates().is_empty());
        assert!(table.ensure_unique().is_ok());
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let table = SummaryAggregator::aggregate(vec![
            Some(summary("a", 1.0)),
            Some(summary("b", 5.0)),
            Some(summary("a", 9.0)),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().primary().unwrap().mean, 9.0);
        assert_eq!(table.duplicates(), &["a".to_string()]);
        assert!(matches!(
            table.ensure_unique(),
            Err(GaugeError::DuplicateGauge { .. })
        ));
    }

    #[test]
    fn test_empty_aggregate() {
        let table = SummaryAggregator::aggregate(Vec::<Option<StationSummary>>::new());
        assert!(table.is_empty());
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_dataframe_layout_single_channel() {
        let table = SummaryAggregator::aggregate(vec![Some(summary("a", 1.0))]);
        let df = table.to_dataframe().unwrap();

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let expected = [
            "gauge_id", "mean", "median", "min", "q1", "q3", "max", "skew", "stdev", "n", "n_jan",
            "n_feb", "n_mar", "n_apr", "n_may", "n_jun", "n_jul", "n_aug", "n_sep", "n_oct",
            "n_nov", "n_dec", "n_gaps", "last_obs", "first_year", "last_year", "yearly_avg",
        ];
        assert_eq!(names, expected);

        assert_eq!(df.column("mean").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::UInt64);
        assert_eq!(df.column("first_year").unwrap().dtype(), &DataType::Int32);
        assert!(matches!(
            df.column("last_obs").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(df.column("skew").unwrap().null_count(), 1);
    }

    #[test]
    fn test_dataframe_layout_multi_channel() {
        let mut two = summary("b", 3.0);
        two.channels.push(channel("stage", 0.7));
        let table = SummaryAggregator::aggregate(vec![Some(summary("a", 1.0)), Some(two)]);
        let df = table.to_dataframe().unwrap();

        assert!(df.column("mean_discharge").is_ok());
        assert!(df.column("mean_stage").is_ok());
        assert!(df.column("yearly_avg_stage").is_ok());
        assert!(df.column("mean").is_err());
        // station "a" has no stage channel
        assert_eq!(df.column("mean_stage").unwrap().null_count(), 1);
        assert_eq!(df.column("n_gaps").unwrap().len(), 2);
    }

    #[test]
    fn test_single_channel_stations_with_different_headers() {
        let mut other = summary("b", 3.0);
        other.channels = vec![channel("Q_m3s", 3.0)];
        let table = SummaryAggregator::aggregate(vec![Some(summary("a", 1.0)), Some(other)]);
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.width(), 27);
        assert!(df.column("mean_discharge").is_err());
        let mean = df.column("mean").unwrap();
        assert_eq!(mean.null_count(), 0);
        assert_eq!(mean.as_materialized_series().f64().unwrap().get(1), Some(3.0));
        assert_eq!(df.column("yearly_avg").unwrap().null_count(), 0);

        let columns = table.numeric_columns();
        let mean = columns.iter().find(|(name, _)| name == "mean").unwrap();
        assert_eq!(mean.1, vec![1.0, 3.0]);
    }

    #[test]
    fn test_empty_table_keeps_plain_layout() {
        let df = SummaryTable::default().to_dataframe().unwrap();
        assert_eq!(df.width(), 27);
        assert!(df.column("mean").is_ok());
    }

    #[test]
    fn test_numeric_columns() {
        let table =
            SummaryAggregator::aggregate(vec![Some(summary("a", 1.0)), Some(summary("b", 3.0))]);
        let columns = table.numeric_columns();

        let mean = columns.iter().find(|(name, _)| name == "mean").unwrap();
        assert_eq!(mean.1, vec![1.0, 3.0]);

        let last_obs = columns.iter().find(|(name, _)| name == "last_obs").unwrap();
        assert_eq!(last_obs.1, vec![2021.0, 2021.0]);

        // skew is undefined for both rows
        let skew = columns.iter().find(|(name, _)| name == "skew").unwrap();
        assert!(skew.1.is_empty());

        assert_eq!(columns.len(), 26);
    }
}
