//! Upload phase: batching, the batch-by-batch driver, and conflict
//! application.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::progress::ProgressSender;
use crate::status::{ResourceFailure, SyncJobStatus, SyncPhase, SyncSummary};
use crate::store::ResourceStore;
use crate::transport::DataTransport;
use async_trait::async_trait;
use ressync_protocol::{ConflictDecision, LocalChange, UploadOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Builds upload requests and parses their responses.
#[async_trait]
pub trait UploadWorkManager: Send + Sync {
    /// Builds one request body for a batch, preserving batch order in
    /// the payload.
    async fn build_request(&self, batch: &[LocalChange]) -> SyncResult<Vec<u8>>;

    /// Parses the server's response into one outcome per batch member,
    /// attributed back to the originating change records.
    async fn parse_response(
        &self,
        raw: &[u8],
        batch: &[LocalChange],
    ) -> SyncResult<Vec<UploadOutcome>>;
}

/// Partitions dirty resources into bounded batches.
///
/// When the configuration carries an ordering comparator it is applied
/// before chunking, so parent-before-child orderings survive into both
/// the request payloads and outcome attribution. Every change lands in
/// exactly one batch.
pub fn partition(mut changes: Vec<LocalChange>, config: &SyncConfig) -> Vec<Vec<LocalChange>> {
    if let Some(order) = &config.upload_order {
        changes.sort_by(|a, b| order(a, b));
    }
    // The builder clamps the batch size, but the field is public.
    changes
        .chunks(config.max_upload_batch_size.max(1))
        .map(<[LocalChange]>::to_vec)
        .collect()
}

struct UploadTally {
    total: u64,
    processed: u64,
    rejected: u64,
    attempted: u64,
}

/// Runs the upload phase.
///
/// Batches are submitted in order. A batch-level transport failure marks
/// every member failed and halts subsequent batches; resources accepted
/// in prior batches stay committed. Conflict decisions that re-upload
/// (AcceptLocal, Merged) run as extra batches at the end of the same
/// pass; a second conflict or rejection there becomes a resource-level
/// failure, so no conflict is left unresolved.
pub(crate) async fn run_upload(
    manager: &dyn UploadWorkManager,
    transport: &dyn DataTransport,
    store: &dyn ResourceStore,
    config: &SyncConfig,
    summary: &mut SyncSummary,
    progress: &ProgressSender,
    cancelled: &AtomicBool,
) -> SyncResult<()> {
    let dirty = store.locally_dirty().await?;
    let mut tally = UploadTally {
        total: dirty.len() as u64,
        processed: 0,
        rejected: 0,
        attempted: 0,
    };

    let mut reuploads = Vec::new();
    for batch in partition(dirty, config) {
        let queued = submit_batch(
            manager, transport, store, config, &batch, summary, &mut tally, progress, cancelled,
            false,
        )
        .await?;
        reuploads.extend(queued);
    }

    // Conflict resolutions that keep local content go out in the same
    // pass, forced against the server's current version.
    while !reuploads.is_empty() {
        let mut next = Vec::new();
        for batch in partition(std::mem::take(&mut reuploads), config) {
            let queued = submit_batch(
                manager, transport, store, config, &batch, summary, &mut tally, progress,
                cancelled, true,
            )
            .await?;
            next.extend(queued);
        }
        reuploads = next;
    }

    if let Some(threshold) = config.rejected_failure_threshold {
        if tally.attempted > 0 && tally.rejected as f64 / tally.attempted as f64 > threshold {
            return Err(SyncError::ResourceFailures {
                rejected: tally.rejected,
                attempted: tally.attempted,
            });
        }
    }

    debug!(uploaded = summary.uploaded, "upload phase complete");
    Ok(())
}

/// Submits one batch and applies its per-resource outcomes. Returns the
/// change records queued for re-upload by conflict decisions.
#[allow(clippy::too_many_arguments)]
async fn submit_batch(
    manager: &dyn UploadWorkManager,
    transport: &dyn DataTransport,
    store: &dyn ResourceStore,
    config: &SyncConfig,
    batch: &[LocalChange],
    summary: &mut SyncSummary,
    tally: &mut UploadTally,
    progress: &ProgressSender,
    cancelled: &AtomicBool,
    final_pass: bool,
) -> SyncResult<Vec<LocalChange>> {
    if cancelled.load(Ordering::SeqCst) {
        return Err(SyncError::Cancelled);
    }

    let body = manager.build_request(batch).await?;
    let raw = match transport.post(body).await {
        Ok(raw) => raw,
        Err(err) => {
            // Whole-batch failure: every member is recorded failed and
            // the phase halts. Prior batches stay committed.
            warn!(batch_size = batch.len(), error = %err, "batch upload failed");
            for change in batch {
                let reason = format!("batch upload failed: {err}");
                // The transport error is the phase error; a store
                // failure while recording it must not replace it.
                if let Err(store_err) = store.mark_failed(change.key(), &reason).await {
                    warn!(key = %change.key(), error = %store_err, "could not record batch failure");
                }
                summary.failures.push(ResourceFailure {
                    key: change.key().clone(),
                    reason,
                });
            }
            return Err(err);
        }
    };

    let outcomes = manager.parse_response(&raw, batch).await?;
    if outcomes.len() != batch.len() {
        return Err(SyncError::Parse(format!(
            "expected {} outcomes, server returned {}",
            batch.len(),
            outcomes.len()
        )));
    }

    let mut reuploads = Vec::new();
    for (change, outcome) in batch.iter().zip(outcomes) {
        if outcome.key() != change.key() {
            return Err(SyncError::Parse(format!(
                "outcome for {} attributed to batch slot holding {}",
                outcome.key(),
                change.key()
            )));
        }

        tally.attempted += 1;
        match outcome {
            UploadOutcome::Accepted { key, new_version } => {
                store.mark_clean(&key, new_version.as_deref()).await?;
                summary.uploaded += 1;
            }
            UploadOutcome::Rejected { key, reason } => {
                store.mark_failed(&key, &reason).await?;
                summary.failures.push(ResourceFailure {
                    key,
                    reason: reason.clone(),
                });
                tally.rejected += 1;
                if config.abort_on_resource_failure {
                    return Err(SyncError::ResourceFailures {
                        rejected: tally.rejected,
                        attempted: tally.attempted,
                    });
                }
            }
            UploadOutcome::Conflict {
                key,
                server_resource,
            } => {
                if final_pass {
                    // A resolution that conflicted again is not retried
                    // within this run.
                    let reason = "conflict unresolved after re-upload".to_string();
                    store.mark_failed(&key, &reason).await?;
                    summary.failures.push(ResourceFailure { key, reason });
                    tally.rejected += 1;
                } else {
                    match config.conflict_resolver.resolve(change, &server_resource) {
                        ConflictDecision::AcceptRemote => {
                            debug!(key = %key, "conflict resolved: adopting server copy");
                            let version = server_resource.version.clone();
                            store.upsert_all(std::slice::from_ref(&server_resource)).await?;
                            store.mark_clean(&key, version.as_deref()).await?;
                        }
                        ConflictDecision::AcceptLocal => {
                            debug!(key = %key, "conflict resolved: keeping local change");
                            reuploads.push(LocalChange::new(
                                change.resource.clone(),
                                server_resource.version.clone(),
                            ));
                        }
                        ConflictDecision::Merged(merged) => {
                            debug!(key = %key, "conflict resolved: merged");
                            store.upsert_all(std::slice::from_ref(&merged)).await?;
                            reuploads.push(LocalChange::new(
                                merged,
                                server_resource.version.clone(),
                            ));
                        }
                    }
                }
            }
        }
        tally.processed += 1;
    }

    progress
        .emit(SyncJobStatus::InProgress {
            phase: SyncPhase::Upload,
            completed: tally.processed,
            total: Some(tally.total),
            resource_type: batch.first().map(|c| c.key().resource_type.clone()),
        })
        .await;

    Ok(reuploads)
}
