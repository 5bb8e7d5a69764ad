//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Network transport consumed by the download and upload drivers.
///
/// The transport owns retry-at-transport-level concerns (timeouts, auth
/// headers, compression); the engine treats any transport failure as
/// opaque. Implementations may be HTTP clients, loopback servers for
/// tests, or anything that answers raw payloads.
#[async_trait]
pub trait DataTransport: Send + Sync {
    /// Issues a GET for one download page URL and returns the raw body.
    async fn get(&self, url: &str) -> SyncResult<Vec<u8>>;

    /// Submits one upload batch body and returns the raw response.
    async fn post(&self, body: Vec<u8>) -> SyncResult<Vec<u8>>;
}

/// A scriptable transport for tests.
///
/// Responses are consumed in FIFO order; an exhausted queue answers with
/// a protocol error so a test that over-fetches fails loudly.
#[derive(Debug, Default)]
pub struct MockTransport {
    get_responses: Mutex<VecDeque<SyncResult<Vec<u8>>>>,
    post_responses: Mutex<VecDeque<SyncResult<Vec<u8>>>>,
    get_urls: Mutex<Vec<String>>,
    post_bodies: Mutex<Vec<Vec<u8>>>,
}

impl MockTransport {
    /// Creates a transport with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a GET response.
    pub fn push_get(&self, response: SyncResult<Vec<u8>>) {
        self.get_responses.lock().push_back(response);
    }

    /// Queues a POST response.
    pub fn push_post(&self, response: SyncResult<Vec<u8>>) {
        self.post_responses.lock().push_back(response);
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.get_urls.lock().clone()
    }

    /// Bodies posted so far, in order.
    pub fn posted_bodies(&self) -> Vec<Vec<u8>> {
        self.post_bodies.lock().clone()
    }

    /// Number of POST requests issued.
    pub fn post_count(&self) -> usize {
        self.post_bodies.lock().len()
    }
}

#[async_trait]
impl DataTransport for MockTransport {
    async fn get(&self, url: &str) -> SyncResult<Vec<u8>> {
        self.get_urls.lock().push(url.to_string());
        self.get_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Parse("no mock GET response queued".into())))
    }

    async fn post(&self, body: Vec<u8>) -> SyncResult<Vec<u8>> {
        self.post_bodies.lock().push(body);
        self.post_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Parse("no mock POST response queued".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_answers_in_fifo_order() {
        let transport = MockTransport::new();
        transport.push_get(Ok(b"one".to_vec()));
        transport.push_get(Ok(b"two".to_vec()));

        assert_eq!(transport.get("/a").await.unwrap(), b"one");
        assert_eq!(transport.get("/b").await.unwrap(), b"two");
        assert_eq!(transport.requested_urls(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn exhausted_queue_is_an_error() {
        let transport = MockTransport::new();
        assert!(transport.get("/a").await.is_err());
        assert!(transport.post(vec![]).await.is_err());
    }

    #[tokio::test]
    async fn scripted_failure_propagates() {
        let transport = MockTransport::new();
        transport.push_post(Err(SyncError::transport_retryable("connection reset")));

        let err = transport.post(b"{}".to_vec()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.post_count(), 1);
    }
}
