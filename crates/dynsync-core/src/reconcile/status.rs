//! Pass / warn / fail verdict for a collection run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SyncError;
use crate::reconcile::model::SyncSummary;

/// Default share of failed items above which a run is an error
pub const DEFAULT_FAIL_ERROR_RATIO: f64 = 0.1;

/// Outcome status persisted in the sync log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Warning,
    Error,
}

impl RunStatus {
    /// Derive the status from a run's error ratio
    ///
    /// - no errors: `Success`
    /// - error ratio at most `fail_error_ratio`: `Warning`
    /// - above it, or errors with nothing processed: `Error`
    pub fn from_summary(summary: &SyncSummary, fail_error_ratio: f64) -> Self {
        if summary.errors == 0 {
            return RunStatus::Success;
        }
        // Deletion-pass failures can occur with an empty snapshot
        if summary.total_processed == 0 || summary.errors >= summary.total_processed {
            return RunStatus::Error;
        }
        if summary.error_ratio() <= fail_error_ratio {
            RunStatus::Warning
        } else {
            RunStatus::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Warning => "WARNING",
            RunStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(RunStatus::Success),
            "WARNING" => Ok(RunStatus::Warning),
            "ERROR" => Ok(RunStatus::Error),
            other => Err(SyncError::Serialization {
                message: format!("unknown run status '{}'", other),
            }),
        }
    }
}
