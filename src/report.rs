//! Per-configuration outcomes and serializable verification reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::snapshot::{Configuration, SnapshotError, SnapshotResult};

/// Result of verifying one configuration of a set
#[derive(Debug)]
pub struct ConfigurationOutcome {
    /// Position of the configuration in its set
    pub index: usize,
    /// The configuration
    pub config: Configuration,
    /// What verification produced
    pub result: SnapshotResult<()>,
}

impl ConfigurationOutcome {
    /// Status of this outcome
    pub fn status(&self) -> OutcomeStatus {
        match &self.result {
            Ok(()) => OutcomeStatus::Passed,
            Err(err) if err.is_recorded() => OutcomeStatus::Recorded,
            Err(_) => OutcomeStatus::Failed,
        }
    }
}

/// The error of the lowest-index failing outcome, if any
pub fn first_error(mut outcomes: Vec<ConfigurationOutcome>) -> SnapshotResult<()> {
    outcomes.sort_by_key(|outcome| outcome.index);
    match outcomes.into_iter().find_map(|outcome| outcome.result.err()) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Status of one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Matched the reference within tolerance
    Passed,
    /// Any failure other than recording
    Failed,
    /// Record mode wrote a new reference
    Recorded,
}

/// One entry of a [`VerificationReport`]
#[derive(Debug, Serialize)]
pub struct OutcomeSummary {
    /// Position in the configuration set
    pub index: usize,
    /// Configuration id
    pub config_id: String,
    /// Status
    pub status: OutcomeStatus,
    /// The error, unless the configuration passed
    pub error: Option<SnapshotError>,
}

/// Result of verifying one test case across a configuration set
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    /// Test name
    pub test: String,
    /// Test file
    pub file_path: PathBuf,
    /// Whether every configuration passed
    pub success: bool,
    /// When the report was built
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Per-configuration results, in set order
    pub outcomes: Vec<OutcomeSummary>,
}

impl VerificationReport {
    /// Summarize outcomes for a test case
    pub fn new(
        test: impl Into<String>,
        file_path: impl Into<PathBuf>,
        mut outcomes: Vec<ConfigurationOutcome>,
    ) -> Self {
        outcomes.sort_by_key(|outcome| outcome.index);
        let outcomes: Vec<OutcomeSummary> = outcomes
            .into_iter()
            .map(|outcome| OutcomeSummary {
                index: outcome.index,
                config_id: outcome.config.id(),
                status: outcome.status(),
                error: outcome.result.err(),
            })
            .collect();
        Self {
            test: test.into(),
            file_path: file_path.into(),
            success: outcomes.iter().all(|o| o.status == OutcomeStatus::Passed),
            timestamp: Utc::now(),
            outcomes,
        }
    }

    /// Count of outcomes with `status`
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
