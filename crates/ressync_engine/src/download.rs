//! Download phase: cursor threading and the page-by-page driver.

use crate::error::{SyncError, SyncResult};
use crate::progress::ProgressSender;
use crate::status::{SyncJobStatus, SyncPhase, SyncSummary};
use crate::store::ResourceStore;
use crate::transport::DataTransport;
use async_trait::async_trait;
use ressync_protocol::DownloadPage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Cursor state threaded through successive download requests.
///
/// A context is created per sync run (or restored from external
/// persistence for resumption). The cursor is immutable once read by a
/// request and replaced wholesale after the response is processed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncContext {
    /// Timestamp of the last completed sync, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Opaque pagination token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl SyncContext {
    /// Creates an empty context (full initial download).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context resuming from a last-sync timestamp.
    pub fn since(timestamp: impl Into<String>) -> Self {
        Self {
            since: Some(timestamp.into()),
            cursor: None,
        }
    }
}

/// Produces download requests and parses their responses.
///
/// `next_request` returning `None` means the download is complete; a
/// page with zero resources does not imply completion.
#[async_trait]
pub trait DownloadWorkManager: Send + Sync {
    /// The next paginated request URL for the given context, or `None`
    /// when there is nothing further to pull.
    async fn next_request(&self, context: &SyncContext) -> SyncResult<Option<String>>;

    /// Parses one raw response body into a page of resources.
    async fn process_response(&self, raw: &[u8]) -> SyncResult<DownloadPage>;
}

/// Runs the download phase: request pages one at a time, persist each
/// page as one atomic upsert, and advance the cursor.
///
/// A fetch or parse failure aborts the phase; pages already committed
/// stay committed (at-least-once, idempotent by key). No internal retry.
pub(crate) async fn run_download(
    manager: &dyn DownloadWorkManager,
    transport: &dyn DataTransport,
    store: &dyn ResourceStore,
    context: &mut SyncContext,
    summary: &mut SyncSummary,
    progress: &ProgressSender,
    cancelled: &AtomicBool,
) -> SyncResult<()> {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Err(SyncError::Cancelled);
        }

        let Some(url) = manager.next_request(context).await? else {
            break;
        };

        debug!(url = %url, "requesting download page");
        let raw = transport.get(&url).await?;
        let page = manager.process_response(&raw).await?;

        store.upsert_all(&page.resources).await?;
        summary.downloaded += page.resources.len() as u64;
        context.cursor = page.next_cursor;

        progress
            .emit(SyncJobStatus::InProgress {
                phase: SyncPhase::Download,
                completed: summary.downloaded,
                total: None,
                resource_type: page
                    .resources
                    .first()
                    .map(|r| r.key.resource_type.clone()),
            })
            .await;
    }

    debug!(downloaded = summary.downloaded, "download phase complete");
    Ok(())
}
