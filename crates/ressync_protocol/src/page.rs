//! Download page payloads.

use crate::error::CodecResult;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// One parsed page of a paginated download response.
///
/// A page with zero resources is valid and does not signal completion;
/// only the work manager returning no further request URL ends the
/// download phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadPage {
    /// Resources carried by this page.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Cursor to thread into the next request, replacing the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl DownloadPage {
    /// Creates a page.
    pub fn new(resources: Vec<Resource>, next_cursor: Option<String>) -> Self {
        Self {
            resources,
            next_cursor,
        }
    }

    /// Creates an empty page with no cursor advance.
    pub fn empty() -> Self {
        Self {
            resources: Vec::new(),
            next_cursor: None,
        }
    }

    /// Decodes a page from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> CodecResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes the page to JSON bytes.
    pub fn to_json(&self) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
