//! Per-entity series storage.
//!
//! One CSV per entity (`<ENTITY>.csv`) with header `date and time,value`,
//! timestamps at millisecond precision. Reads accept both precision
//! renderings. Raw bodies of shape-failed responses go to a separate error
//! directory named deterministically by entity.

use crate::series::{format_timestamp, parse_timestamp, Series, TimePoint};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header of the timestamp column in every series file.
pub const TIMESTAMP_COLUMN: &str = "date and time";

/// Header of the value column.
pub const VALUE_COLUMN: &str = "value";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing '{TIMESTAMP_COLUMN}' column in {0}")]
    MissingColumn(PathBuf),

    #[error("unparseable row {row} in {path}: '{text}'")]
    Malformed {
        path: PathBuf,
        row: usize,
        text: String,
    },
}

/// Directory of per-entity series files.
pub struct SeriesStore {
    dir: PathBuf,
}

impl SeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn series_path(&self, entity_id: &str) -> PathBuf {
        self.dir.join(format!("{entity_id}.csv"))
    }

    /// Persist a series wholesale. The write replaces any previous file for
    /// the entity and never touches other entities' files.
    pub fn write_series(&self, series: &Series) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(self.series_path(&series.entity_id))?;
        writer.write_record([TIMESTAMP_COLUMN, VALUE_COLUMN])?;
        for point in &series.points {
            writer.write_record([format_timestamp(point.timestamp), point.value.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read an entity's series back. Any unparseable row fails the whole
    /// file — a half-read series would poison validation and merge.
    pub fn read_series(&self, entity_id: &str) -> Result<Series, StoreError> {
        let path = self.series_path(entity_id);
        let mut reader = csv::Reader::from_path(&path)?;

        let headers = reader.headers()?;
        if headers.get(0) != Some(TIMESTAMP_COLUMN) {
            return Err(StoreError::MissingColumn(path));
        }

        let mut series = Series::new(entity_id);
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // Data rows start at 2 (row 1 is the header).
            let row = i + 2;
            let text = record.get(0).unwrap_or_default();
            let timestamp = parse_timestamp(text).ok_or_else(|| StoreError::Malformed {
                path: path.clone(),
                row,
                text: text.to_string(),
            })?;
            let value_text = record.get(1).unwrap_or_default();
            let value: f64 = value_text.parse().map_err(|_| StoreError::Malformed {
                path: path.clone(),
                row,
                text: value_text.to_string(),
            })?;
            series.points.push(TimePoint { timestamp, value });
        }
        Ok(series)
    }

    /// Entities with a series file present, in sorted order. Sorting makes
    /// discovery order deterministic across platforms.
    pub fn list_entities(&self) -> Result<Vec<String>, StoreError> {
        let mut entities = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entities.push(stem.to_string());
            }
        }
        entities.sort();
        Ok(entities)
    }
}

/// Persist the raw body of a shape-failed response for later inspection.
/// Returns the path written.
pub fn write_error_payload(
    error_dir: &Path,
    entity_id: &str,
    body: &str,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(error_dir)?;
    let path = error_dir.join(format!("{entity_id}_error_response.txt"));
    fs::write(&path, body)?;
    Ok(path)
}
