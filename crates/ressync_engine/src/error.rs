//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Resource-level outcomes (a single rejected resource, a single
/// conflict) are not errors; they are absorbed into the run summary.
/// These variants cover phase-level failures only.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or HTTP failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the scheduler may retry the run.
        retryable: bool,
    },

    /// Malformed response payload. Not retryable without a code fix.
    #[error("parse error: {0}")]
    Parse(String),

    /// The resource store failed.
    #[error("store error: {0}")]
    Store(String),

    /// A required collaborator was missing or misconfigured.
    #[error("precondition failure: {0}")]
    Precondition(String),

    /// Resource-level failures exceeded the configured policy.
    #[error("resource failures exceeded policy: {rejected} of {attempted} rejected")]
    ResourceFailures {
        /// Resources the server rejected.
        rejected: u64,
        /// Resources given an outcome this pass.
        attempted: u64,
    },

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    /// Invalid state transition.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Returns true if the scheduler may retry the run after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Store(_) => true,
            SyncError::Parse(_) => false,
            SyncError::Precondition(_) => false,
            SyncError::ResourceFailures { .. } => false,
            SyncError::Cancelled => false,
            SyncError::InvalidStateTransition { .. } => false,
        }
    }

    /// Stable tag naming the error kind, used in serialized summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport { .. } => "transport",
            SyncError::Parse(_) => "parse",
            SyncError::Store(_) => "store",
            SyncError::Precondition(_) => "precondition",
            SyncError::ResourceFailures { .. } => "resource_failures",
            SyncError::Cancelled => "cancelled",
            SyncError::InvalidStateTransition { .. } => "invalid_state_transition",
        }
    }
}

impl From<ressync_protocol::CodecError> for SyncError {
    fn from(err: ressync_protocol::CodecError) -> Self {
        SyncError::Parse(err.to_string())
    }
}
