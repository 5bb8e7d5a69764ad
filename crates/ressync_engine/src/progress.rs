//! Progress event plumbing.
//!
//! One bounded mpsc channel carries events from the run to a single
//! forwarding task, which republishes them on a broadcast channel for
//! zero-or-more subscribers. The orchestrator joins the forwarder on
//! every exit path, so no event is lost after run completion is
//! reported. Subscribers may still miss events (the broadcast drops on
//! lag); the terminal event is the source of truth.

use crate::status::SyncJobStatus;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Sending half of the progress stream.
#[derive(Debug, Clone)]
pub(crate) struct ProgressSender {
    tx: mpsc::Sender<SyncJobStatus>,
}

impl ProgressSender {
    /// Creates a bounded progress channel.
    pub(crate) fn channel(buffer: usize) -> (Self, mpsc::Receiver<SyncJobStatus>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Emits one event. Best-effort: a closed channel is ignored.
    pub(crate) async fn emit(&self, status: SyncJobStatus) {
        let _ = self.tx.send(status).await;
    }
}

/// Spawns the forwarding task. It drains the mpsc receiver into the
/// broadcast sender and exits when the last `ProgressSender` is dropped.
pub(crate) fn spawn_forwarder(
    mut rx: mpsc::Receiver<SyncJobStatus>,
    subscribers: broadcast::Sender<SyncJobStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(status) = rx.recv().await {
            // No subscribers is fine; events are best-effort.
            let _ = subscribers.send(status);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SyncSummary;

    #[tokio::test]
    async fn forwarder_republishes_in_order_and_drains() {
        let (progress, rx) = ProgressSender::channel(8);
        let (subscribers, mut sub_rx) = broadcast::channel(8);
        let handle = spawn_forwarder(rx, subscribers);

        progress.emit(SyncJobStatus::Started).await;
        progress
            .emit(SyncJobStatus::Finished {
                summary: SyncSummary::default(),
            })
            .await;
        drop(progress);

        handle.await.unwrap();

        assert_eq!(sub_rx.recv().await.unwrap(), SyncJobStatus::Started);
        assert!(sub_rx.recv().await.unwrap().is_terminal());
    }

    #[tokio::test]
    async fn emitting_without_subscribers_is_fine() {
        let (progress, rx) = ProgressSender::channel(8);
        let (subscribers, _) = broadcast::channel(8);
        let handle = spawn_forwarder(rx, subscribers);

        progress.emit(SyncJobStatus::Started).await;
        drop(progress);
        handle.await.unwrap();
    }
}
