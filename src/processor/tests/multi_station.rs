//! Multi-station integration tests

use crate::config::GaugeConfig;
use crate::error::GaugeError;
use crate::processor::GaugeProcessor;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_station(dir: &Path, name: &str, rows: &[(&str, f64)]) {
    fs::create_dir_all(dir).unwrap();
    let mut content = String::from("date,discharge\n");
    for (date, value) in rows {
        content.push_str(&format!("{},{}\n", date, value));
    }
    fs::write(dir.join(name), content).unwrap();
}

/// Helper to create several stations across nested directories
fn create_multi_station_input(temp_dir: &TempDir) -> PathBuf {
    let input = temp_dir.path().join("input");
    write_station(
        &input.join("north"),
        "station_c.csv",
        &[("2019-01-01", 3.0), ("2019-06-01", 4.0)],
    );
    write_station(
        &input.join("north"),
        "station_a.csv",
        &[("2020-01-01", 1.0), ("2020-01-02", 2.0), ("2020-01-03", 3.0)],
    );
    write_station(
        &input.join("south"),
        "station_b.csv",
        &[("2021-05-05", 10.0)],
    );
    input
}

fn gauge_ids(df: &DataFrame) -> Vec<String> {
    df.column("gauge_id")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|id| id.unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_rows_sorted_by_gauge_id() {
    let temp_dir = TempDir::new().unwrap();
    let input = create_multi_station_input(&temp_dir);
    let output_path = temp_dir.path().join("summary.csv");

    let processor = GaugeProcessor::new(input, Some(output_path.clone()))
        .unwrap()
        .with_config(GaugeConfig::default().with_max_concurrent_files(2))
        .without_progress();
    let stats = processor.process().await.unwrap();

    assert_eq!(stats.files_processed, 3);
    assert_eq!(stats.stations_written, 3);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(output_path))
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(gauge_ids(&df), vec!["station_a", "station_b", "station_c"]);
}

#[tokio::test]
async fn test_duplicate_gauge_last_write_wins() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    // "a/dup.csv" sorts before "b/dup.csv", so the second file wins
    write_station(&input.join("a"), "dup.csv", &[("2020-01-01", 1.0)]);
    write_station(&input.join("b"), "dup.csv", &[("2020-01-01", 9.0)]);
    let output_path = temp_dir.path().join("summary.parquet");

    let processor = GaugeProcessor::new(input, Some(output_path.clone()))
        .unwrap()
        .with_config(
            GaugeConfig::default().with_output_format(crate::config::OutputFormat::Parquet),
        )
        .without_progress();
    let stats = processor.process().await.unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.stations_written, 1);
    assert_eq!(stats.duplicate_gauges, vec!["dup".to_string()]);

    let df = ParquetReader::new(fs::File::open(&output_path).unwrap())
        .finish()
        .unwrap();
    let mean = df.column("mean").unwrap().as_materialized_series().clone();
    assert_eq!(mean.f64().unwrap().get(0), Some(9.0));
}

#[tokio::test]
async fn test_duplicate_gauge_can_be_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    write_station(&input.join("a"), "dup.csv", &[("2020-01-01", 1.0)]);
    write_station(&input.join("b"), "dup.csv", &[("2020-01-01", 9.0)]);

    let processor = GaugeProcessor::new(input, Some(temp_dir.path().join("summary.csv")))
        .unwrap()
        .with_config(GaugeConfig::default().with_fail_on_duplicate())
        .without_progress();

    match processor.process().await {
        Err(GaugeError::DuplicateGauge { gauge_ids }) => assert_eq!(gauge_ids, vec!["dup"]),
        other => panic!("Expected DuplicateGauge error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multi_channel_stations() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    fs::create_dir_all(&input).unwrap();
    fs::write(
        input.join("g1.csv"),
        "date,discharge,stage\n2020-01-01,1.0,0.5\n2020-01-02,3.0,0.7\n",
    )
    .unwrap();
    fs::write(input.join("g2.csv"), "date,discharge\n2020-02-01,5.0\n").unwrap();
    let output_path = temp_dir.path().join("summary.csv");

    let processor = GaugeProcessor::new(input, Some(output_path.clone()))
        .unwrap()
        .without_progress();
    processor.process().await.unwrap();

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(output_path))
        .unwrap()
        .finish()
        .unwrap();

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert!(names.contains(&"mean_discharge".to_string()));
    assert!(names.contains(&"mean_stage".to_string()));
    assert!(names.contains(&"yearly_avg_stage".to_string()));

    let stage = df
        .column("mean_stage")
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap();
    assert_eq!(stage.f64().unwrap().get(1), None);
}
