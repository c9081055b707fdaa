//! End-to-end pipeline tests: download against a canned transport, persist
//! to a temp store, then validate and merge what landed on disk.

use chrono::NaiveDateTime;
use std::path::Path;
use std::time::Duration;
use traffic_core::config::PipelineConfig;
use traffic_core::decode::SECURITY_PREAMBLE;
use traffic_core::download::download_entities;
use traffic_core::fetch::FetchClient;
use traffic_core::merge::merge_store_to_file;
use traffic_core::retry::RetryPolicy;
use traffic_core::stats::RunStats;
use traffic_core::store::SeriesStore;
use traffic_core::transport::{Transport, TransportError};
use traffic_core::validate::validate_store;
use traffic_core::window::RequestWindow;

/// Transport that serves a fixed body per entity and times out for unknown
/// entities.
struct CannedTransport {
    per_entity: Vec<(String, String)>,
}

impl Transport for CannedTransport {
    fn fetch_raw(&self, window: &RequestWindow) -> Result<String, TransportError> {
        self.per_entity
            .iter()
            .find(|(entity, _)| *entity == window.entity_id)
            .map(|(_, body)| body.clone())
            .ok_or(TransportError::Timeout)
    }
}

/// Payload with `points` hourly observations starting 2019-01-01 plus
/// `malformed` trailing entries that fail schema validation.
fn body_with(points: usize, malformed: usize) -> String {
    let mut rows: Vec<String> = (0..points)
        .map(|i| {
            format!(
                "[{}, [[null, {}]]]",
                1_546_300_800_000i64 + i as i64 * 3_600_000,
                1.0 + i as f64 * 0.001
            )
        })
        .collect();
    rows.extend((0..malformed).map(|_| "\"bogus\"".to_string()));
    format!("{SECURITY_PREAMBLE}[[0, [{}]]]", rows.join(", "))
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn january_config(dir: &Path, entities: &[&str]) -> PipelineConfig {
    PipelineConfig {
        entities: entities.iter().map(|e| e.to_string()).collect(),
        start: dt("2019-01-01 00:00:00"),
        end: dt("2019-01-31 23:59:59"),
        output_dir: dir.join("data"),
        error_dir: dir.join("errors"),
        request_delay_ms: 0,
        max_retries: 3,
        base_delay_ms: 0,
    }
}

fn client(per_entity: Vec<(String, String)>) -> FetchClient {
    FetchClient::new(
        Box::new(CannedTransport { per_entity }),
        RetryPolicy::new(3, Duration::ZERO),
        Duration::ZERO,
    )
}

#[test]
fn single_window_with_360_points_and_two_anomalies() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = january_config(dir.path(), &["US"]);
    std::fs::create_dir_all(&cfg.output_dir).unwrap();
    let store = SeriesStore::new(&cfg.output_dir);
    let stats = RunStats::new();

    let client = client(vec![("US".into(), body_with(360, 2))]);
    let summary = download_entities(&client, &store, &cfg, &stats).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.total_points, 360);
    assert_eq!(summary.shape_anomalies, 2);
    assert_eq!(summary.gaps, 0);
    assert_eq!(stats.retries(), 0);
    assert_eq!(stats.anomalies(), 2);

    let series = store.read_series("US").unwrap();
    assert_eq!(series.len(), 360);
}

#[test]
fn download_validate_merge_chain() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = january_config(dir.path(), &["AA", "BB", "CC"]);
    std::fs::create_dir_all(&cfg.output_dir).unwrap();
    let store = SeriesStore::new(&cfg.output_dir);
    let stats = RunStats::new();

    // AA and BB share an index; CC misses the final hour.
    let client = client(vec![
        ("AA".into(), body_with(5, 0)),
        ("BB".into(), body_with(5, 0)),
        ("CC".into(), body_with(4, 0)),
    ]);
    let summary = download_entities(&client, &store, &cfg, &stats).unwrap();
    assert!(summary.all_succeeded());

    // Validation: AA (sorted first) is the reference; CC deviates.
    let validation = validate_store(&store).unwrap();
    assert_eq!(validation.reference_entity.as_deref(), Some("AA"));
    assert_eq!(validation.consistent, 2);
    assert_eq!(validation.inconsistent, 1);
    assert!(!validation.all_consistent());
    assert_eq!(validation.reports.len(), 2);
    assert!(validation.reports[0].is_consistent());
    let report = &validation.reports[1];
    assert_eq!(report.entity_id, "CC");
    assert!(!report.is_consistent());
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.length_shortfall, Some(1));
    assert!(report.positional_mismatches.is_empty());

    // Merge: union index keeps the row CC is missing, with an NA cell.
    let output = dir.path().join("merged.csv");
    let merge_stats = merge_store_to_file(&store, &output).unwrap();
    assert_eq!(merge_stats.files_processed, 3);
    assert_eq!(merge_stats.total_entities, 3);
    assert_eq!(merge_stats.total_timestamps, 5);
    assert!(merge_stats.clean());
    assert_eq!(merge_stats.coverage["AA"], 1.0);
    assert!((merge_stats.coverage["CC"] - 0.8).abs() < 1e-12);

    let merged = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(lines[0], "date and time,AA,BB,CC");
    assert_eq!(lines.len(), 6);
    assert!(lines[5].ends_with(",NA"), "last row should have an NA cell for CC: {}", lines[5]);
}

#[test]
fn gap_entities_do_not_disturb_neighbors() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = january_config(dir.path(), &["AA", "ZZ"]);
    std::fs::create_dir_all(&cfg.output_dir).unwrap();
    let store = SeriesStore::new(&cfg.output_dir);
    let stats = RunStats::new();

    // ZZ has no canned body, so every attempt times out.
    let client = client(vec![("AA".into(), body_with(3, 0))]);
    let summary = download_entities(&client, &store, &cfg, &stats).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].0, "ZZ");
    assert_eq!(stats.exhausted(), 1);
    // Three attempts for the one gap window.
    assert_eq!(stats.retries(), 2);

    assert_eq!(store.list_entities().unwrap(), vec!["AA"]);
}
