//! # Ressync Protocol
//!
//! Resource model and wire payload types for the ressync engine.
//!
//! This crate provides:
//! - `Resource` and `ResourceKey` for domain records keyed by type + id
//! - `LocalChange` dirty records with the prior remote version
//! - `DownloadPage` parsed pull payloads
//! - `UploadOutcome` per-resource push results
//! - `ConflictDecision` resolution outcomes
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decision;
mod error;
mod outcome;
mod page;
mod resource;

pub use decision::ConflictDecision;
pub use error::{CodecError, CodecResult};
pub use outcome::{UploadOutcome, UploadResponse};
pub use page::DownloadPage;
pub use resource::{LocalChange, Resource, ResourceKey};
