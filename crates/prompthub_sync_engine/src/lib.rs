//! # PromptHub Sync Engine
//!
//! WebDAV backup and synchronization engine for PromptHub.
//!
//! This crate provides:
//! - A sync orchestrator that serializes runs through a small state machine
//! - Manifest-based change detection over section fingerprints
//! - Last-writer-wins conflict resolution at whole-payload granularity
//! - Snapshot assembly and restore over injected local collaborators
//! - A WebDAV transport speaking Basic Auth over pluggable HTTP
//!
//! ## Architecture
//!
//! The host application injects its storage behind the [`LocalStore`],
//! [`ImageStore`], [`SettingsReader`] and [`SettingsWriter`] traits and
//! a remote behind [`DavTransport`]. Each run builds a fresh local
//! snapshot, resolves the remote manifest, and transfers in exactly one
//! direction. The payload travels as JSON, optionally encrypted with a
//! passphrase; the manifest stays plaintext and is the only state that
//! survives between runs.
//!
//! ## Key Invariants
//!
//! - The payload file is always written before the manifest describing it
//! - Expected failures surface as failed [`SyncResult`]s, never panics
//! - Individual image failures are logged and counted, never fatal
//! - A run never retries internally; every run stands alone

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod manifest;
mod restore;
mod snapshot;
mod state;
mod store;
mod transport;

pub use config::SyncConfig;
pub use error::{EngineResult, SyncError};
#[cfg(feature = "reqwest-client")]
pub use http::ReqwestExchange;
pub use http::{HttpExchange, HttpRequest, HttpResponse, WebDavClient, CLIENT_ID_HEADER, USER_AGENT};
pub use manifest::{resolve_manifest, ManifestComparison};
pub use restore::{RestoreApplier, RestoreStats};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use state::{
    SyncDetails, SyncEngine, SyncResult, SyncState, SyncStats, BACKUP_FILE, DATA_FILE,
    MANIFEST_FILE,
};
pub use store::{
    ImageStore, LocalStore, MemoryImageStore, MemoryLocalStore, MemorySettingsStore,
    SettingsReader, SettingsWriter,
};
pub use transport::{DavTransport, FailMode, MemoryDavServer};
