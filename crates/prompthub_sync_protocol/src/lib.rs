//! # PromptHub Sync Protocol
//!
//! Backup payload, manifest, and conflict types for PromptHub sync.
//!
//! This crate provides:
//! - Typed records for every backup section
//! - `BackupPayload` and `BackupManifest` wire documents
//! - Canonical-JSON section fingerprints for change detection
//! - The last-writer-wins sync direction decision
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod error;
mod fingerprint;
mod manifest;
mod payload;
mod records;

pub use conflict::{decide, SyncDirection};
pub use error::{ProtocolError, ProtocolResult};
pub use fingerprint::{canonical_json, section_fingerprints, sha256_hex};
pub use manifest::{BackupManifest, Section};
pub use payload::{BackupPayload, SCHEMA_VERSION};
pub use records::{AiConfig, Folder, Prompt, PromptVersion, UserSettings};
