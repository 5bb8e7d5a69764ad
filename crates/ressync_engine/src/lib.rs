//! # Ressync Engine
//!
//! Bidirectional synchronization engine between a local resource store
//! and a remote resource-oriented HTTP server.
//!
//! This crate provides:
//! - Sync state machine (not started → download → upload → finished)
//! - Paginated download driver with cursor threading
//! - Batched upload driver with per-resource outcomes
//! - Conflict detection and resolution
//! - Progress events over a drained broadcast stream
//! - Scheduler boundary (attempt outcomes, retry cap, result payloads)
//!
//! ## Architecture
//!
//! One run is sequential: the download phase fully completes, page by
//! page, before the upload phase begins, so conflict detection runs
//! against freshly pulled remote state. Within a phase, requests are
//! issued one at a time because each step depends on the previous
//! response (cursor or per-batch outcome).
//!
//! Collaborators are injected as capability traits: the resource store,
//! the transport, the download and upload work managers, and the
//! conflict resolver. The host scheduler owns retry and backoff; the
//! engine reports one terminal outcome per invocation and never retries
//! internally.
//!
//! ## Key invariants
//!
//! - Page and batch writes are atomic units, idempotent by resource key
//! - An empty page is a valid step; only an absent next URL completes
//!   the download
//! - Accepted resources are never left dirty; rejected resources are
//!   never cleared
//! - No conflict is left unresolved at the end of an upload pass
//! - Concurrent invocations on one synchronizer serialize

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod conflict;
mod download;
mod error;
mod http;
mod progress;
mod scheduler;
mod state;
mod status;
mod store;
mod transport;
mod upload;

pub use config::{ChangeOrdering, SyncConfig, SyncDirection};
pub use conflict::{AcceptLocalResolver, AcceptRemoteResolver, ConflictResolver};
pub use download::{DownloadWorkManager, SyncContext};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpTransport};
pub use scheduler::{serialize_status, AttemptOutcome, RetryPolicy};
pub use state::{RunState, SyncRunResult, SyncStats, Synchronizer};
pub use status::{ErrorInfo, ResourceFailure, SyncJobStatus, SyncPhase, SyncSummary};
pub use store::{MemoryResourceStore, ResourceStore};
pub use transport::{DataTransport, MockTransport};
pub use upload::{partition, UploadWorkManager};
