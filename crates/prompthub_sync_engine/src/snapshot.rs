//! Local snapshot assembly.

use crate::config::SyncConfig;
use crate::error::EngineResult;
use crate::store::{ImageStore, LocalStore, SettingsReader};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use prompthub_sync_protocol::{BackupManifest, BackupPayload};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

/// A freshly built local snapshot, ready for comparison or upload.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The full payload built from local data.
    pub payload: BackupPayload,
    /// Manifest describing the payload.
    pub manifest: BackupManifest,
    /// Latest local modification instant, the conflict comparison key.
    ///
    /// Unix epoch when the store is completely empty, so any remote
    /// backup wins against a fresh install.
    pub local_latest: DateTime<Utc>,
    /// Image file names that could not be read and were left out.
    pub skipped_images: Vec<String>,
}

/// Assembles snapshots from the injected local collaborators.
pub struct SnapshotBuilder<L: LocalStore, I: ImageStore, S: SettingsReader> {
    store: Arc<L>,
    images: Arc<I>,
    settings: Arc<S>,
}

impl<L: LocalStore, I: ImageStore, S: SettingsReader> SnapshotBuilder<L, I, S> {
    /// Creates a builder over the given collaborators.
    pub fn new(store: Arc<L>, images: Arc<I>, settings: Arc<S>) -> Self {
        Self { store, images, settings }
    }

    /// Builds a snapshot of the current local state.
    ///
    /// Records are sorted by id so identical data always produces
    /// identical bytes and fingerprints. Unreadable images are logged
    /// and skipped rather than failing the build; a store read failure
    /// is fatal.
    pub fn build(&self, config: &SyncConfig) -> EngineResult<Snapshot> {
        let mut prompts = self.store.export_prompts()?;
        prompts.sort_by(|a, b| a.id.cmp(&b.id));
        let mut folders = self.store.export_folders()?;
        folders.sort_by(|a, b| a.id.cmp(&b.id));
        let mut versions = self.store.export_versions()?;
        versions.sort_by(|a, b| a.id.cmp(&b.id));

        let mut skipped_images = Vec::new();
        let mut images = BTreeMap::new();
        if config.include_images {
            let mut names = BTreeSet::new();
            for prompt in &prompts {
                for name in &prompt.images {
                    names.insert(name.clone());
                }
            }
            for name in names {
                match self.images.read(&name) {
                    Ok(bytes) => {
                        images.insert(name, BASE64_STANDARD.encode(bytes));
                    }
                    Err(err) => {
                        warn!("skipping unreadable image {}: {}", name, err);
                        skipped_images.push(name);
                    }
                }
            }
        }

        let mut payload = BackupPayload::new(DateTime::UNIX_EPOCH);
        payload.prompts = prompts;
        payload.folders = folders;
        payload.versions = if versions.is_empty() { None } else { Some(versions) };
        payload.images = if images.is_empty() { None } else { Some(images) };
        payload.ai_config = self.settings.ai_config()?;
        payload.settings = self.settings.settings()?;

        // The stamp is derived from the data, so rebuilding an unchanged
        // store reproduces the same payload byte for byte. An empty
        // store keeps the epoch stamp and loses every conflict
        // comparison, so it can never overwrite a populated remote.
        if let Some(latest) = payload.latest_updated_at() {
            payload.exported_at = latest;
        }
        let local_latest = payload.exported_at;

        let manifest = BackupManifest::for_payload(&payload)?;
        Ok(Snapshot { payload, manifest, local_latest, skipped_images })
    }
}
