//! Reconciliation output types.

use serde::{Deserialize, Serialize};

use crate::errors::ExError;

/// How one incoming record was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Identity not previously persisted
    New,
    /// Identity known, fingerprint changed
    Updated,
    /// Identity known, fingerprint equal
    Unchanged,
}

/// Successful classification of one incoming record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub identity: String,
    pub classification: Classification,
    /// True if the identity was tombstoned before this run
    pub resurrected: bool,
}

/// Per-record result: failures are values, not early returns
pub type RecordResult = Result<ClassifiedRecord, ExError>;

/// Aggregate counts of a reconciliation run
///
/// `total_processed` counts every incoming item, including failed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total_processed: u64,
    pub new: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub deleted: u64,
    /// Revived identities, also counted in `updated` or `unchanged`
    pub resurrected: u64,
    pub errors: u64,
}

impl SyncSummary {
    /// Share of processed items that failed (0.0 for an empty run)
    pub fn error_ratio(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.errors as f64 / self.total_processed as f64
        }
    }

    pub(crate) fn count(&mut self, classified: &ClassifiedRecord) {
        match classified.classification {
            Classification::New => self.new += 1,
            Classification::Updated => self.updated += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
        if classified.resurrected {
            self.resurrected += 1;
        }
    }
}

/// Everything a reconciliation run produced
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub summary: SyncSummary,
    /// One entry per incoming item, in source order
    pub results: Vec<RecordResult>,
    /// Identities tombstoned by this run, sorted
    pub deleted: Vec<String>,
    /// Failures of the deletion pass
    pub deletion_failures: Vec<ExError>,
}

impl ReconcileOutcome {
    /// All failures of the run: per-record first, then deletion pass
    pub fn failures(&self) -> impl Iterator<Item = &ExError> {
        self.results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .chain(self.deletion_failures.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_ratio() {
        let empty = SyncSummary::default();
        assert_eq!(empty.error_ratio(), 0.0);

        let summary = SyncSummary {
            total_processed: 4,
            errors: 1,
            ..Default::default()
        };
        assert!((summary.error_ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_count_tracks_resurrections() {
        let mut summary = SyncSummary::default();
        summary.count(&ClassifiedRecord {
            identity: "A".into(),
            classification: Classification::Unchanged,
            resurrected: true,
        });
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.resurrected, 1);
    }
}
