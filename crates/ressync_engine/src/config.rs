//! Configuration for the sync engine.

use crate::conflict::{AcceptRemoteResolver, ConflictResolver};
use ressync_protocol::LocalChange;
use std::cmp::Ordering;
use std::sync::Arc;

/// Direction and ordering of the phases in one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncDirection {
    /// Pull remote changes first, then push local changes.
    #[default]
    DownloadThenUpload,
    /// Pull only; local changes are left dirty.
    DownloadOnly,
    /// Push only; the download phase is skipped.
    UploadOnly,
}

impl SyncDirection {
    /// Returns true if the run includes the download phase.
    pub fn downloads(&self) -> bool {
        !matches!(self, SyncDirection::UploadOnly)
    }

    /// Returns true if the run includes the upload phase.
    pub fn uploads(&self) -> bool {
        !matches!(self, SyncDirection::DownloadOnly)
    }
}

/// Comparator applied to dirty resources before batch partitioning,
/// e.g. to upload parent resources before children.
pub type ChangeOrdering = Arc<dyn Fn(&LocalChange, &LocalChange) -> Ordering + Send + Sync>;

/// Configuration for sync runs.
#[derive(Clone)]
pub struct SyncConfig {
    /// Phase direction/order for the run.
    pub direction: SyncDirection,
    /// Maximum resources per upload batch.
    pub max_upload_batch_size: usize,
    /// Optional ordering comparator applied before partitioning.
    pub upload_order: Option<ChangeOrdering>,
    /// Conflict resolution strategy.
    pub conflict_resolver: Arc<dyn ConflictResolver>,
    /// Escalate the run to Failed on the first Rejected resource.
    pub abort_on_resource_failure: bool,
    /// Escalate the run to Failed when the rejected fraction of attempted
    /// uploads exceeds this at the end of the upload phase.
    pub rejected_failure_threshold: Option<f64>,
    /// Bound of the progress event channel.
    pub progress_buffer: usize,
}

impl SyncConfig {
    /// Creates a configuration with defaults: download-then-upload,
    /// batches of 100, server-wins conflict resolution.
    pub fn new() -> Self {
        Self {
            direction: SyncDirection::DownloadThenUpload,
            max_upload_batch_size: 100,
            upload_order: None,
            conflict_resolver: Arc::new(AcceptRemoteResolver),
            abort_on_resource_failure: false,
            rejected_failure_threshold: None,
            progress_buffer: 64,
        }
    }

    /// Sets the sync direction.
    pub fn with_direction(mut self, direction: SyncDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the maximum upload batch size. Clamped to at least one
    /// resource per batch.
    pub fn with_max_upload_batch_size(mut self, size: usize) -> Self {
        self.max_upload_batch_size = size.max(1);
        self
    }

    /// Sets the upload ordering comparator.
    pub fn with_upload_order(mut self, order: ChangeOrdering) -> Self {
        self.upload_order = Some(order);
        self
    }

    /// Sets the conflict resolution strategy.
    pub fn with_conflict_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.conflict_resolver = resolver;
        self
    }

    /// Fails the run on the first Rejected resource.
    pub fn with_abort_on_resource_failure(mut self, abort: bool) -> Self {
        self.abort_on_resource_failure = abort;
        self
    }

    /// Sets the rejected-fraction threshold that fails the run.
    pub fn with_rejected_failure_threshold(mut self, threshold: f64) -> Self {
        self.rejected_failure_threshold = Some(threshold);
        self
    }

    /// Sets the progress channel bound.
    pub fn with_progress_buffer(mut self, buffer: usize) -> Self {
        self.progress_buffer = buffer.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("direction", &self.direction)
            .field("max_upload_batch_size", &self.max_upload_batch_size)
            .field("upload_order", &self.upload_order.as_ref().map(|_| ".."))
            .field("abort_on_resource_failure", &self.abort_on_resource_failure)
            .field("rejected_failure_threshold", &self.rejected_failure_threshold)
            .field("progress_buffer", &self.progress_buffer)
            .finish()
    }
}
