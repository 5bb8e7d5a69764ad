//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, a loopback server in tests, etc.).

use crate::error::{SyncError, SyncResult};
use crate::transport::DataTransport;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP stack. The client
/// owns timeouts, auth headers, and compression; errors are reported as
/// opaque strings.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, String>;

    /// Sends a POST request and returns the response body.
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;
}

/// HTTP-based data transport.
///
/// Download page URLs produced by a work manager may be relative
/// (`"patients?page=2"`) or absolute next-page links; relative URLs are
/// joined onto the base URL. Upload batches always POST to the
/// configured upload path.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    upload_path: String,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport POSTing batches to `upload_path`.
    pub fn new(base_url: impl Into<String>, upload_path: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            upload_path: upload_path.into(),
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true if the last request succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn check_configured(&self) -> SyncResult<()> {
        if self.base_url.is_empty() {
            return Err(SyncError::Precondition("transport base URL not configured".into()));
        }
        Ok(())
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    fn record_failure(&self, message: &str) -> SyncError {
        *self.last_error.write() = Some(message.to_string());
        self.connected.store(false, Ordering::SeqCst);
        SyncError::transport_retryable(message)
    }

    fn record_success(&self) {
        *self.last_error.write() = None;
        self.connected.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl<C: HttpClient> DataTransport for HttpTransport<C> {
    async fn get(&self, url: &str) -> SyncResult<Vec<u8>> {
        self.check_configured()?;
        let url = self.resolve(url);
        match self.client.get(&url).await {
            Ok(body) => {
                self.record_success();
                Ok(body)
            }
            Err(message) => Err(self.record_failure(&message)),
        }
    }

    async fn post(&self, body: Vec<u8>) -> SyncResult<Vec<u8>> {
        self.check_configured()?;
        let url = self.resolve(&self.upload_path);
        match self.client.post(&url, body).await {
            Ok(body) => {
                self.record_success();
                Ok(body)
            }
            Err(message) => Err(self.record_failure(&message)),
        }
    }
}
