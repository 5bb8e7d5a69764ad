//! Conflict decisions.

use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// Resolution for one conflicting resource.
///
/// Exactly one decision is produced per conflicting resource per upload
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ConflictDecision {
    /// Keep the local change: force overwrite, re-upload against the
    /// server's current version.
    AcceptLocal,
    /// Discard the local change and adopt the server copy; no re-upload.
    AcceptRemote,
    /// Persist a merged resource and re-upload it.
    Merged(Resource),
}

impl ConflictDecision {
    /// Returns true if the decision requires a further upload this pass.
    pub fn reuploads(&self) -> bool {
        !matches!(self, ConflictDecision::AcceptRemote)
    }
}
