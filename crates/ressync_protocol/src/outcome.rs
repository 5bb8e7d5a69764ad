//! Per-resource upload outcomes.

use crate::error::CodecResult;
use crate::resource::{Resource, ResourceKey};
use serde::{Deserialize, Serialize};

/// The server's verdict for one uploaded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The server accepted the change and assigned a new version.
    Accepted {
        /// Identity of the accepted resource.
        key: ResourceKey,
        /// Server-assigned version after the change.
        new_version: Option<String>,
    },
    /// The server holds a different version than the change was based on.
    Conflict {
        /// Identity of the conflicting resource.
        key: ResourceKey,
        /// The resource as the server currently knows it.
        server_resource: Resource,
    },
    /// The server refused the change (validation or policy).
    Rejected {
        /// Identity of the rejected resource.
        key: ResourceKey,
        /// Server-supplied reason.
        reason: String,
    },
}

impl UploadOutcome {
    /// Identity of the resource this outcome refers to.
    pub fn key(&self) -> &ResourceKey {
        match self {
            UploadOutcome::Accepted { key, .. } => key,
            UploadOutcome::Conflict { key, .. } => key,
            UploadOutcome::Rejected { key, .. } => key,
        }
    }

    /// Returns true for an accepted outcome.
    pub fn is_accepted(&self) -> bool {
        matches!(self, UploadOutcome::Accepted { .. })
    }
}

/// Parsed response for one upload batch.
///
/// Outcomes are attributed back to the originating change records by key;
/// the server returns one outcome per batch member, in batch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// One outcome per uploaded resource, in batch order.
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadResponse {
    /// Creates a response.
    pub fn new(outcomes: Vec<UploadOutcome>) -> Self {
        Self { outcomes }
    }

    /// Decodes a response from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> CodecResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes the response to JSON bytes.
    pub fn to_json(&self) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
