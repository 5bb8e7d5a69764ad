//! Sync job status and run summaries.

use crate::error::SyncError;
use ressync_protocol::ResourceKey;
use serde::{Deserialize, Serialize};

/// Phase of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Pulling remote changes.
    Download,
    /// Pushing local changes.
    Upload,
}

/// An error reduced to its kind tag and message.
///
/// Serialized progress payloads carry this instead of the full error to
/// respect payload size limits at the scheduler boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error kind tag.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&SyncError> for ErrorInfo {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// A resource-level failure recorded in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFailure {
    /// Identity of the failed resource.
    pub key: ResourceKey,
    /// What went wrong for this resource.
    pub reason: String,
}

/// Counts accumulated over one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Resources persisted from download pages.
    pub downloaded: u64,
    /// Resources accepted by the server during upload.
    pub uploaded: u64,
    /// Resource-level failures (rejected or unresolved), non-fatal.
    #[serde(default)]
    pub failures: Vec<ResourceFailure>,
}

/// Status of a sync job, externalized through the progress stream.
///
/// Events are best-effort notifications; consumers must tolerate missed
/// events and rely on the final terminal event for truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncJobStatus {
    /// The run has begun.
    Started,
    /// A phase is underway.
    InProgress {
        /// Current phase.
        phase: SyncPhase,
        /// Resources completed so far in this phase.
        completed: u64,
        /// Estimated total for this phase, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
        /// Resource type currently being processed, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource_type: Option<String>,
    },
    /// The run completed; resource-level failures may be recorded.
    Finished {
        /// Final counts.
        summary: SyncSummary,
    },
    /// The run failed at phase level.
    Failed {
        /// The triggering error, reduced to kind + message.
        error: ErrorInfo,
        /// Whatever was accumulated before the failure.
        summary: SyncSummary,
    },
}

impl SyncJobStatus {
    /// Returns true for Finished and Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncJobStatus::Finished { .. } | SyncJobStatus::Failed { .. }
        )
    }

    /// The summary carried by a terminal status.
    pub fn summary(&self) -> Option<&SyncSummary> {
        match self {
            SyncJobStatus::Finished { summary } => Some(summary),
            SyncJobStatus::Failed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}
