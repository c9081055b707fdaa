//! Timestamp-consistency validation across independently fetched series.
//!
//! The first readable series (in sorted discovery order) supplies the
//! reference index; every other series must match it element-for-element.
//! Set comparison alone would miss reordering, so a positional comparison
//! runs independently over the shared prefix.

use crate::series::Series;
use crate::store::SeriesStore;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// `reference[index] != candidate[index]` at a position both sequences cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalMismatch {
    pub index: usize,
    pub expected: NaiveDateTime,
    pub actual: NaiveDateTime,
}

/// Comparison of one candidate series against the reference index.
#[derive(Debug)]
pub struct SeriesReport {
    pub entity_id: String,
    /// Timestamps present in the reference but absent from the candidate.
    pub missing: Vec<NaiveDateTime>,
    /// Timestamps present in the candidate but absent from the reference.
    pub extra: Vec<NaiveDateTime>,
    pub positional_mismatches: Vec<PositionalMismatch>,
    /// How many elements the candidate falls short of the reference at the
    /// tail. Reported as its own condition, never folded into `missing`.
    pub length_shortfall: Option<usize>,
}

impl SeriesReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
            && self.extra.is_empty()
            && self.positional_mismatches.is_empty()
            && self.length_shortfall.is_none()
    }
}

/// Compare a candidate's timestamp index against the reference.
pub fn compare_to_reference(reference: &Series, candidate: &Series) -> SeriesReport {
    let ref_ts: Vec<NaiveDateTime> = reference.timestamps().collect();
    let cand_ts: Vec<NaiveDateTime> = candidate.timestamps().collect();

    let ref_set: BTreeSet<NaiveDateTime> = ref_ts.iter().copied().collect();
    let cand_set: BTreeSet<NaiveDateTime> = cand_ts.iter().copied().collect();

    let missing: Vec<NaiveDateTime> = ref_set.difference(&cand_set).copied().collect();
    let extra: Vec<NaiveDateTime> = cand_set.difference(&ref_set).copied().collect();

    let shared = ref_ts.len().min(cand_ts.len());
    let positional_mismatches: Vec<PositionalMismatch> = (0..shared)
        .filter(|&i| ref_ts[i] != cand_ts[i])
        .map(|i| PositionalMismatch {
            index: i,
            expected: ref_ts[i],
            actual: cand_ts[i],
        })
        .collect();

    let length_shortfall = (cand_ts.len() < ref_ts.len()).then(|| ref_ts.len() - cand_ts.len());

    SeriesReport {
        entity_id: candidate.entity_id.clone(),
        missing,
        extra,
        positional_mismatches,
        length_shortfall,
    }
}

/// Aggregate verdict over a store's series.
#[derive(Debug, Default)]
pub struct ValidationSummary {
    /// Entity whose series supplied the reference index.
    pub reference_entity: Option<String>,
    pub consistent: usize,
    pub inconsistent: usize,
    /// Entities whose files could not be read, with the reason. These are
    /// skipped, not fatal — but they fail the run.
    pub unreadable: Vec<(String, String)>,
    /// One report per compared candidate, in discovery order. The reference
    /// series itself gets none.
    pub reports: Vec<SeriesReport>,
}

impl ValidationSummary {
    /// Success means every series was readable and matched the reference.
    pub fn all_consistent(&self) -> bool {
        self.inconsistent == 0 && self.unreadable.is_empty()
    }
}

/// Validate every series in the store against the first readable one.
///
/// Per-entity read failures are recorded and skipped; only a failure to list
/// the directory itself is returned as an error.
pub fn validate_store(store: &SeriesStore) -> Result<ValidationSummary, crate::store::StoreError> {
    let entities = store.list_entities()?;
    let mut summary = ValidationSummary::default();
    let mut reference: Option<Series> = None;

    for entity in entities {
        let series = match store.read_series(&entity) {
            Ok(series) => series,
            Err(err) => {
                tracing::warn!(entity = %entity, error = %err, "skipping unreadable series");
                summary.unreadable.push((entity, err.to_string()));
                continue;
            }
        };

        match &reference {
            None => {
                tracing::info!(entity = %entity, "using series as reference index");
                summary.reference_entity = Some(entity);
                summary.consistent += 1;
                reference = Some(series);
            }
            Some(reference) => {
                let report = compare_to_reference(reference, &series);
                if report.is_consistent() {
                    summary.consistent += 1;
                } else {
                    tracing::warn!(
                        entity = %report.entity_id,
                        missing = report.missing.len(),
                        extra = report.extra.len(),
                        mismatched = report.positional_mismatches.len(),
                        shortfall = report.length_shortfall.unwrap_or(0),
                        "timestamp index deviates from reference"
                    );
                    summary.inconsistent += 1;
                }
                summary.reports.push(report);
            }
        }
    }

    Ok(summary)
}
