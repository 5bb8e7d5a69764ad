//! Scheduler boundary: terminal outcomes, retry policy, serialized
//! result payloads.
//!
//! The host scheduler invokes the orchestrator once per attempt,
//! persists the serialized result payload, and re-invokes on its own
//! backoff schedule. The engine never retries internally.

use crate::error::{SyncError, SyncResult};
use crate::status::SyncJobStatus;
use serde::{Deserialize, Serialize};

/// Terminal outcome of one scheduled attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The run finished; do not reschedule.
    Success,
    /// The run failed on a transient error; the scheduler may re-invoke.
    Retry,
    /// The run failed permanently; re-invoking will not help.
    PermanentFailure,
}

impl AttemptOutcome {
    /// Classifies a phase-level error: retryable errors ask for Retry,
    /// everything else is permanent.
    pub fn for_error(err: &SyncError) -> Self {
        if err.is_retryable() {
            AttemptOutcome::Retry
        } else {
            AttemptOutcome::PermanentFailure
        }
    }
}

/// Caps retries across attempts.
///
/// The scheduler persists the attempt count; once it exceeds the
/// maximum, a Retry-eligible report is converted to PermanentFailure so
/// retry is never attempted indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Decides the effective outcome for a completed attempt
    /// (`attempt` is 1-based).
    pub fn decide(&self, attempt: u32, reported: AttemptOutcome) -> AttemptOutcome {
        match reported {
            AttemptOutcome::Retry if attempt >= self.max_attempts => {
                AttemptOutcome::PermanentFailure
            }
            other => other,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Serializes a job status into the payload handed to the scheduler:
/// a `state` tag plus state-specific fields, with any error reduced to
/// kind + message.
pub fn serialize_status(status: &SyncJobStatus) -> SyncResult<String> {
    serde_json::to_string(status).map_err(|e| SyncError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ErrorInfo, SyncSummary};

    #[test]
    fn outcome_classification() {
        assert_eq!(
            AttemptOutcome::for_error(&SyncError::transport_retryable("reset")),
            AttemptOutcome::Retry
        );
        assert_eq!(
            AttemptOutcome::for_error(&SyncError::Parse("bad".into())),
            AttemptOutcome::PermanentFailure
        );
        assert_eq!(
            AttemptOutcome::for_error(&SyncError::Precondition("no transport".into())),
            AttemptOutcome::PermanentFailure
        );
    }

    #[test]
    fn retry_capped_at_max_attempts() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.decide(1, AttemptOutcome::Retry), AttemptOutcome::Retry);
        assert_eq!(policy.decide(2, AttemptOutcome::Retry), AttemptOutcome::Retry);
        assert_eq!(
            policy.decide(3, AttemptOutcome::Retry),
            AttemptOutcome::PermanentFailure
        );
        // Success is never converted.
        assert_eq!(
            policy.decide(9, AttemptOutcome::Success),
            AttemptOutcome::Success
        );
    }

    #[test]
    fn zero_attempt_policy_is_clamped() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn serialized_payload_carries_state_tag() {
        let payload = serialize_status(&SyncJobStatus::Failed {
            error: ErrorInfo {
                kind: "transport".into(),
                message: "transport error: reset".into(),
            },
            summary: SyncSummary {
                downloaded: 4,
                uploaded: 0,
                failures: Vec::new(),
            },
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["error"]["kind"], "transport");
        assert_eq!(value["summary"]["downloaded"], 4);
    }
}
