//! Union merge of per-entity series into one wide table.
//!
//! The index is the ascending sorted union of every series' timestamps —
//! never the intersection, so one entity's coverage gap cannot drop rows for
//! the others. The accumulator is a two-level ordered map (timestamp, then
//! entity), which makes row and column order a property of the keys alone:
//! identical inputs in any discovery order produce byte-identical output.

use crate::series::{format_timestamp, Series};
use crate::store::{SeriesStore, StoreError, TIMESTAMP_COLUMN};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Literal token written for a (timestamp, entity) cell with no value.
pub const MISSING_SENTINEL: &str = "NA";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no readable series to merge")]
    Empty,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wide table: one row per distinct timestamp, one column per entity.
#[derive(Debug)]
pub struct MergedTable {
    entities: Vec<String>,
    cells: BTreeMap<NaiveDateTime, BTreeMap<String, f64>>,
}

impl MergedTable {
    /// Ascending sorted union of all input timestamps.
    pub fn index(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.cells.keys().copied()
    }

    /// Entity columns in ascending sorted order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// The entity's value at a timestamp, if recorded.
    pub fn value(&self, timestamp: NaiveDateTime, entity_id: &str) -> Option<f64> {
        self.cells.get(&timestamp).and_then(|row| row.get(entity_id)).copied()
    }

    /// Points present for an entity divided by the index size. Diagnoses
    /// partial downloads.
    pub fn coverage(&self, entity_id: &str) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let present = self
            .cells
            .values()
            .filter(|row| row.contains_key(entity_id))
            .count();
        present as f64 / self.cells.len() as f64
    }

    /// Write the table as CSV: header `date and time,<entity>,...`, one row
    /// per timestamp, missing cells rendered as the sentinel.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), MergeError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.entities.len() + 1);
        header.push(TIMESTAMP_COLUMN.to_string());
        header.extend(self.entities.iter().cloned());
        csv_writer.write_record(&header)?;

        for (timestamp, row) in &self.cells {
            let mut record = Vec::with_capacity(self.entities.len() + 1);
            record.push(format_timestamp(*timestamp));
            for entity in &self.entities {
                record.push(match row.get(entity) {
                    Some(value) => value.to_string(),
                    None => MISSING_SENTINEL.to_string(),
                });
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, MergeError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| MergeError::Io(std::io::Error::other(e)))
    }
}

/// Merge in-memory series onto a shared sorted timestamp axis.
pub fn merge_series(series: impl IntoIterator<Item = Series>) -> MergedTable {
    let mut entity_set = BTreeSet::new();
    let mut cells: BTreeMap<NaiveDateTime, BTreeMap<String, f64>> = BTreeMap::new();

    for s in series {
        entity_set.insert(s.entity_id.clone());
        for point in &s.points {
            cells
                .entry(point.timestamp)
                .or_default()
                .insert(s.entity_id.clone(), point.value);
        }
    }

    MergedTable {
        entities: entity_set.into_iter().collect(),
        cells,
    }
}

/// Merge statistics for the end-of-run summary.
#[derive(Debug, Default)]
pub struct MergeStats {
    pub files_processed: usize,
    /// Unreadable/skipped files with reasons.
    pub skipped: Vec<(String, String)>,
    pub total_entities: usize,
    pub total_timestamps: usize,
    /// Per-entity coverage ratio, sorted by entity.
    pub coverage: BTreeMap<String, f64>,
}

impl MergeStats {
    pub fn clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Read every series in the store and merge them. Unreadable entities are
/// skipped and recorded; the merge continues with the remainder.
pub fn merge_store(store: &SeriesStore) -> Result<(MergedTable, MergeStats), MergeError> {
    let entities = store.list_entities()?;
    let mut stats = MergeStats::default();
    let mut series = Vec::new();

    for entity in entities {
        match store.read_series(&entity) {
            Ok(s) => {
                stats.files_processed += 1;
                series.push(s);
            }
            Err(err) => {
                tracing::warn!(entity = %entity, error = %err, "skipping unreadable series");
                stats.skipped.push((entity, err.to_string()));
            }
        }
    }

    if series.is_empty() {
        return Err(MergeError::Empty);
    }

    let table = merge_series(series);
    stats.total_entities = table.entities().len();
    stats.total_timestamps = table.row_count();
    for entity in table.entities() {
        stats.coverage.insert(entity.clone(), table.coverage(entity));
    }

    Ok((table, stats))
}

/// Merge a store into a CSV file at `output`.
pub fn merge_store_to_file(store: &SeriesStore, output: &Path) -> Result<MergeStats, MergeError> {
    let (table, stats) = merge_store(store)?;
    let file = std::fs::File::create(output)?;
    table.write_csv(file)?;
    tracing::info!(
        output = %output.display(),
        entities = stats.total_entities,
        timestamps = stats.total_timestamps,
        "merged table written"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{timestamp_from_millis, TimePoint};

    fn series(entity: &str, points: &[(i64, f64)]) -> Series {
        let mut s = Series::new(entity);
        s.append(points.iter().map(|&(ms, value)| TimePoint {
            timestamp: timestamp_from_millis(ms).unwrap(),
            value,
        }));
        s
    }

    fn ts(ms: i64) -> NaiveDateTime {
        timestamp_from_millis(ms).unwrap()
    }

    #[test]
    fn index_is_union_not_intersection() {
        let a = series("AA", &[(1_000, 0.1), (2_000, 0.2), (3_000, 0.3)]);
        let b = series("BB", &[(2_000, 1.2), (3_000, 1.3), (4_000, 1.4)]);

        let table = merge_series([a, b]);

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.entities(), ["AA", "BB"]);
        assert_eq!(table.value(ts(1_000), "BB"), None);
        assert_eq!(table.value(ts(4_000), "AA"), None);
        assert_eq!(table.value(ts(2_000), "AA"), Some(0.2));
        assert_eq!(table.value(ts(2_000), "BB"), Some(1.2));
    }

    #[test]
    fn output_identical_regardless_of_input_order() {
        let a = series("AA", &[(1_000, 0.1), (2_000, 0.2)]);
        let b = series("BB", &[(2_000, 1.2), (3_000, 1.3)]);

        let forward = merge_series([a.clone(), b.clone()]).to_csv_string().unwrap();
        let reverse = merge_series([b, a]).to_csv_string().unwrap();

        assert_eq!(forward, reverse);
    }

    #[test]
    fn missing_cells_render_sentinel() {
        let a = series("AA", &[(1_000, 0.5)]);
        let b = series("BB", &[(2_000, 1.5)]);

        let csv = merge_series([a, b]).to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date and time,AA,BB");
        assert_eq!(lines[1], "1970-01-01 00:00:01.000,0.5,NA");
        assert_eq!(lines[2], "1970-01-01 00:00:02.000,NA,1.5");
    }

    #[test]
    fn coverage_ratio() {
        let a = series("AA", &[(1_000, 0.1), (2_000, 0.2), (3_000, 0.3)]);
        let b = series("BB", &[(2_000, 1.2)]);

        let table = merge_series([a, b]);
        assert_eq!(table.coverage("AA"), 1.0);
        assert!((table.coverage("BB") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn store_merge_skips_unreadable_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeriesStore::new(dir.path());
        store.write_series(&series("AA", &[(1_000, 0.1)])).unwrap();
        store.write_series(&series("BB", &[(1_000, 1.1)])).unwrap();
        std::fs::write(store.series_path("CC"), "date and time,value\nbad,row\n").unwrap();

        let (table, stats) = merge_store(&store).unwrap();
        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].0, "CC");
        assert!(!stats.clean());
        assert_eq!(table.entities(), ["AA", "BB"]);
        assert_eq!(stats.coverage["AA"], 1.0);
    }

    #[test]
    fn empty_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeriesStore::new(dir.path());
        assert!(matches!(merge_store(&store), Err(MergeError::Empty)));
    }
}
