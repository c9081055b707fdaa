//! Download orchestrator — drives entities × windows and persists series.
//!
//! Per-window and per-entity failures are absorbed into the summary; the run
//! only fails outright on a rejected date range (checked before any I/O) or
//! an unwritable destination. Aborting between entities leaves earlier
//! writes intact — each series file is written wholesale per entity.

use crate::config::PipelineConfig;
use crate::fetch::{FetchClient, FetchObserver, GapReason};
use crate::series::Series;
use crate::store::{write_error_payload, SeriesStore, StoreError};
use crate::window::{month_windows, validate_range, WindowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("cannot write to destination: {0}")]
    Store(#[from] StoreError),
}

/// Summary of a whole download run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub total_entities: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_points: usize,
    /// Windows that yielded no data after retries or due to shape errors.
    pub gaps: usize,
    /// Individual payload elements rejected by schema validation.
    pub shape_anomalies: usize,
    /// Failed entities with reasons.
    pub failures: Vec<(String, String)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn log(&self) {
        tracing::info!(
            entities = self.total_entities,
            succeeded = self.succeeded,
            failed = self.failed,
            points = self.total_points,
            gaps = self.gaps,
            anomalies = self.shape_anomalies,
            "download summary"
        );
        for (entity, reason) in self.failures.iter().take(10) {
            tracing::warn!(entity = %entity, reason = %reason, "entity failed");
        }
        if self.failures.len() > 10 {
            tracing::warn!(more = self.failures.len() - 10, "additional entities failed");
        }
    }
}

/// Fetch every configured entity across month windows and persist one series
/// file per entity.
pub fn download_entities(
    client: &FetchClient,
    store: &SeriesStore,
    config: &PipelineConfig,
    observer: &dyn FetchObserver,
) -> Result<DownloadSummary, DownloadError> {
    validate_range(config.start, config.end)?;

    let mut summary = DownloadSummary {
        total_entities: config.entities.len(),
        ..Default::default()
    };

    for entity in &config.entities {
        let mut series = Series::new(entity.clone());
        let mut entity_gaps = 0usize;

        for window in month_windows(entity, config.start, config.end)? {
            let fetched = client.fetch_window(&window, observer);
            summary.shape_anomalies += fetched.anomaly_count;

            if let Some(gap) = fetched.gap {
                summary.gaps += 1;
                entity_gaps += 1;
                if let (GapReason::Shape(_), Some(body)) = (&gap.reason, &gap.raw_body) {
                    write_error_payload(&config.error_dir, entity, body)?;
                }
                continue;
            }

            series.append(fetched.points);
        }

        if series.is_empty() {
            let reason = if entity_gaps > 0 {
                format!("no data downloaded ({entity_gaps} gap windows)")
            } else {
                "empty response".to_string()
            };
            tracing::warn!(entity = %entity, reason = %reason, "no series written");
            summary.failed += 1;
            summary.failures.push((entity.clone(), reason));
            continue;
        }

        store.write_series(&series)?;
        tracing::info!(entity = %entity, points = series.len(), gaps = entity_gaps, "series written");
        summary.succeeded += 1;
        summary.total_points += series.len();
    }

    Ok(summary)
}
