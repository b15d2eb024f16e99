//! Applies a downloaded payload to the local store.

use crate::error::EngineResult;
use crate::store::{ImageStore, LocalStore, SettingsReader, SettingsWriter};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use prompthub_sync_protocol::BackupPayload;
use std::sync::Arc;
use tracing::warn;

/// Counts of what one restore applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreStats {
    /// Prompts written to the store.
    pub prompts: usize,
    /// Folders written to the store.
    pub folders: usize,
    /// Versions written to the store.
    pub versions: usize,
    /// Images decoded and written.
    pub images_written: usize,
    /// Images that failed to decode or write.
    pub images_failed: usize,
}

/// Applies decoded payloads to the injected local collaborators.
pub struct RestoreApplier<L, I, S>
where
    L: LocalStore,
    I: ImageStore,
    S: SettingsReader + SettingsWriter,
{
    store: Arc<L>,
    images: Arc<I>,
    settings: Arc<S>,
}

impl<L, I, S> RestoreApplier<L, I, S>
where
    L: LocalStore,
    I: ImageStore,
    S: SettingsReader + SettingsWriter,
{
    /// Creates an applier over the given collaborators.
    pub fn new(store: Arc<L>, images: Arc<I>, settings: Arc<S>) -> Self {
        Self { store, images, settings }
    }

    /// Applies `payload` to the local store.
    ///
    /// Records replace existing ones with the same id; local records the
    /// payload does not mention are left alone. Settings merge
    /// field-by-field so device-specific values survive. Individual
    /// image failures are logged and counted, never fatal; a store
    /// write failure is.
    pub fn apply(&self, payload: &BackupPayload) -> EngineResult<RestoreStats> {
        payload.check_version()?;

        let mut stats = RestoreStats::default();

        self.store.import_prompts(&payload.prompts)?;
        stats.prompts = payload.prompts.len();

        self.store.import_folders(&payload.folders)?;
        stats.folders = payload.folders.len();

        if let Some(versions) = &payload.versions {
            self.store.import_versions(versions)?;
            stats.versions = versions.len();
        }

        if let Some(images) = &payload.images {
            for (name, encoded) in images {
                match BASE64_STANDARD.decode(encoded) {
                    Ok(bytes) => match self.images.write(name, &bytes) {
                        Ok(()) => stats.images_written += 1,
                        Err(err) => {
                            warn!("failed to write image {}: {}", name, err);
                            stats.images_failed += 1;
                        }
                    },
                    Err(err) => {
                        warn!("failed to decode image {}: {}", name, err);
                        stats.images_failed += 1;
                    }
                }
            }
        }

        if let Some(remote_config) = &payload.ai_config {
            let mut merged = self.settings.ai_config()?.unwrap_or_default();
            merged.merge_from(remote_config);
            self.settings.write_ai_config(&merged)?;
        }

        if let Some(remote_settings) = &payload.settings {
            let mut merged = self.settings.settings()?.unwrap_or_default();
            merged.merge_from(remote_settings);
            self.settings.write_settings(&merged)?;
        }

        Ok(stats)
    }
}
