//! The synchronizer: state machine and run orchestration.

use crate::config::SyncConfig;
use crate::download::{run_download, DownloadWorkManager, SyncContext};
use crate::error::{SyncError, SyncResult};
use crate::progress::{spawn_forwarder, ProgressSender};
use crate::scheduler::AttemptOutcome;
use crate::status::{ErrorInfo, SyncJobStatus, SyncPhase, SyncSummary};
use crate::store::ResourceStore;
use crate::transport::DataTransport;
use crate::upload::{run_upload, UploadWorkManager};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// The state of the synchronizer, visible between and during runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run has started yet.
    NotStarted,
    /// A run is in the given phase.
    Running(SyncPhase),
    /// The last run finished.
    Finished,
    /// The last run failed.
    Failed,
}

impl RunState {
    /// Returns true while a run is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running(_))
    }
}

/// Counters accumulated across runs of one synchronizer.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that reached Finished.
    pub runs_completed: u64,
    /// Runs that reached Failed.
    pub runs_failed: u64,
    /// Total resources persisted from download pages.
    pub resources_downloaded: u64,
    /// Total resources accepted by the server.
    pub resources_uploaded: u64,
    /// Total resource-level failures recorded.
    pub resource_failures: u64,
    /// Message of the last phase-level error.
    pub last_error: Option<String>,
}

/// Everything one invocation hands back to the caller.
#[derive(Debug, Clone)]
pub struct SyncRunResult {
    /// Terminal status (Finished or Failed), also the last progress event.
    pub status: SyncJobStatus,
    /// Outcome for the host scheduler.
    pub outcome: AttemptOutcome,
    /// Context after the run; persist it to resume pagination next run.
    pub context: SyncContext,
}

/// Drives one sync run at a time: download phase, then upload phase,
/// with progress events and a single terminal state per invocation.
///
/// Collaborators are injected as capability trait objects; the
/// synchronizer owns no storage, no network stack, and no retry loop.
pub struct Synchronizer {
    config: SyncConfig,
    store: Arc<dyn ResourceStore>,
    transport: Arc<dyn DataTransport>,
    download: Arc<dyn DownloadWorkManager>,
    upload: Arc<dyn UploadWorkManager>,
    state: RwLock<RunState>,
    stats: RwLock<SyncStats>,
    subscribers: broadcast::Sender<SyncJobStatus>,
    run_lock: Mutex<()>,
    cancelled: AtomicBool,
}

impl Synchronizer {
    /// Creates a synchronizer from its injected capabilities.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn ResourceStore>,
        transport: Arc<dyn DataTransport>,
        download: Arc<dyn DownloadWorkManager>,
        upload: Arc<dyn UploadWorkManager>,
    ) -> Self {
        let (subscribers, _) = broadcast::channel(config.progress_buffer.max(16));
        Self {
            config,
            store,
            transport,
            download,
            upload,
            state: RwLock::new(RunState::NotStarted),
            stats: RwLock::new(SyncStats::default()),
            subscribers,
            run_lock: Mutex::new(()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    /// Cumulative stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Subscribes to progress events. Events are best-effort; a lagging
    /// subscriber drops the oldest events, and the terminal event of the
    /// returned `SyncRunResult` is the source of truth.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncJobStatus> {
        self.subscribers.subscribe()
    }

    /// Requests cooperative cancellation of the run in flight. No
    /// further pages or batches are issued; committed writes remain.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Runs one sync attempt. Concurrent invocations on the same
    /// instance serialize: a second caller blocks until the first has
    /// produced its terminal state.
    ///
    /// Never returns an error: every failure is converted into a
    /// `Failed` terminal status inside the result.
    pub async fn synchronize(&self, context: SyncContext) -> SyncRunResult {
        let _guard = self.run_lock.lock().await;
        self.run_locked(context).await
    }

    /// Runs one sync attempt, rejecting instead of blocking when a run
    /// is already in flight.
    pub async fn try_synchronize(&self, context: SyncContext) -> SyncResult<SyncRunResult> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                to: "synchronize".into(),
            });
        };
        Ok(self.run_locked(context).await)
    }

    async fn run_locked(&self, mut context: SyncContext) -> SyncRunResult {
        self.cancelled.store(false, Ordering::SeqCst);

        let (progress, rx) = ProgressSender::channel(self.config.progress_buffer);
        let forwarder = spawn_forwarder(rx, self.subscribers.clone());

        progress.emit(SyncJobStatus::Started).await;
        info!(direction = ?self.config.direction, "sync run started");

        let mut summary = SyncSummary::default();
        let result = self.run_phases(&mut context, &mut summary, &progress).await;

        let (status, outcome) = match result {
            Ok(()) => {
                *self.state.write() = RunState::Finished;
                let mut stats = self.stats.write();
                stats.runs_completed += 1;
                stats.resources_downloaded += summary.downloaded;
                stats.resources_uploaded += summary.uploaded;
                stats.resource_failures += summary.failures.len() as u64;
                stats.last_error = None;
                info!(
                    downloaded = summary.downloaded,
                    uploaded = summary.uploaded,
                    failures = summary.failures.len(),
                    "sync run finished"
                );
                (
                    SyncJobStatus::Finished { summary },
                    AttemptOutcome::Success,
                )
            }
            Err(err) => {
                *self.state.write() = RunState::Failed;
                let mut stats = self.stats.write();
                stats.runs_failed += 1;
                stats.resources_downloaded += summary.downloaded;
                stats.resources_uploaded += summary.uploaded;
                stats.resource_failures += summary.failures.len() as u64;
                stats.last_error = Some(err.to_string());
                warn!(error = %err, "sync run failed");
                (
                    SyncJobStatus::Failed {
                        error: ErrorInfo::from(&err),
                        summary,
                    },
                    AttemptOutcome::for_error(&err),
                )
            }
        };

        progress.emit(status.clone()).await;
        drop(progress);
        // Drain the forwarder so no event is lost after completion is
        // reported. The forwarder never panics, but a cancelled runtime
        // must not turn into a panic here either.
        let _ = forwarder.await;

        SyncRunResult {
            status,
            outcome,
            context,
        }
    }

    async fn run_phases(
        &self,
        context: &mut SyncContext,
        summary: &mut SyncSummary,
        progress: &ProgressSender,
    ) -> SyncResult<()> {
        if self.config.direction.downloads() {
            *self.state.write() = RunState::Running(SyncPhase::Download);
            run_download(
                self.download.as_ref(),
                self.transport.as_ref(),
                self.store.as_ref(),
                context,
                summary,
                progress,
                &self.cancelled,
            )
            .await?;
        }

        if self.config.direction.uploads() {
            *self.state.write() = RunState::Running(SyncPhase::Upload);
            run_upload(
                self.upload.as_ref(),
                self.transport.as_ref(),
                self.store.as_ref(),
                &self.config,
                summary,
                progress,
                &self.cancelled,
            )
            .await?;
        }

        Ok(())
    }
}
