//! Sync orchestration and run lifecycle.

use crate::config::SyncConfig;
use crate::error::{EngineResult, SyncError};
use crate::manifest::resolve_manifest;
use crate::restore::RestoreApplier;
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::store::{ImageStore, LocalStore, SettingsReader, SettingsWriter};
use crate::transport::DavTransport;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use prompthub_codec::PayloadCodec;
use prompthub_sync_protocol::{decide, BackupManifest, BackupPayload, Section, SyncDirection};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Remote file holding the whole-payload backup.
pub const BACKUP_FILE: &str = "prompthub-backup.json";
/// Remote file holding the backup manifest. Never encrypted.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Remote file holding the payload written by incremental uploads.
pub const DATA_FILE: &str = "data.json";

/// Lifecycle state of a sync engine.
///
/// Every run moves `Idle | Completed | Failed` to `ResolvingManifest`,
/// then to at most one transfer state, then to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No run has started yet.
    Idle,
    /// Building the local snapshot and fetching the remote manifest.
    ResolvingManifest,
    /// Pushing the payload and manifest to the server.
    Uploading,
    /// Fetching and applying the remote payload.
    Downloading,
    /// The last run finished successfully.
    Completed,
    /// The last run failed.
    Failed,
}

impl SyncState {
    /// Returns true while a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::ResolvingManifest | SyncState::Uploading | SyncState::Downloading
        )
    }

    /// Returns true if a new run may start.
    pub fn can_start_sync(&self) -> bool {
        !self.is_active()
    }
}

/// Cumulative statistics across the runs of one engine.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that completed successfully.
    pub runs_completed: u64,
    /// Runs that failed.
    pub runs_failed: u64,
    /// Prompts pushed to the server, summed over runs.
    pub prompts_uploaded: u64,
    /// Prompts fetched from the server, summed over runs.
    pub prompts_downloaded: u64,
    /// Error message of the most recent failed run.
    pub last_error: Option<String>,
}

/// Transfer counters for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDetails {
    /// Prompts pushed to the server.
    pub prompts_uploaded: usize,
    /// Prompts fetched from the server.
    pub prompts_downloaded: usize,
    /// Images pushed to the server.
    pub images_uploaded: usize,
    /// Images fetched from the server.
    pub images_downloaded: usize,
}

/// Outcome of one public sync operation.
///
/// Expected failures, wrong passphrases and unreachable servers
/// included, surface as `success = false` with a user-facing message.
/// Public operations never panic and never return `Err`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Completion time, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Transfer counters, present when data moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SyncDetails>,
}

impl SyncResult {
    /// Creates a successful result.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Some(Utc::now()),
            details: None,
        }
    }

    /// Creates a successful result carrying transfer counters.
    pub fn ok_with_details(message: impl Into<String>, details: SyncDetails) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Some(Utc::now()),
            details: Some(details),
        }
    }

    /// Creates a failed result.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: None,
            details: None,
        }
    }
}

/// What a completed run did.
enum Outcome {
    Uploaded { details: SyncDetails },
    Downloaded { details: SyncDetails },
    NoOp,
}

/// Synchronizes the local store against a WebDAV backup collection.
///
/// One engine serves one remote endpoint. Runs are serialized: starting
/// an operation while another is active yields a failed result. The
/// engine holds no remote state between runs; each run starts from a
/// fresh snapshot and a fresh manifest fetch.
pub struct SyncEngine<T, L, I, S>
where
    T: DavTransport,
    L: LocalStore,
    I: ImageStore,
    S: SettingsReader + SettingsWriter,
{
    config: SyncConfig,
    transport: T,
    builder: SnapshotBuilder<L, I, S>,
    applier: RestoreApplier<L, I, S>,
    codec: PayloadCodec,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<T, L, I, S> SyncEngine<T, L, I, S>
where
    T: DavTransport,
    L: LocalStore,
    I: ImageStore,
    S: SettingsReader + SettingsWriter,
{
    /// Creates an engine over the given transport and collaborators.
    ///
    /// This is the one place a configuration contract violation returns
    /// `Err`; every failure after construction surfaces as a failed
    /// [`SyncResult`].
    pub fn new(
        config: SyncConfig,
        transport: T,
        store: L,
        images: I,
        settings: S,
    ) -> EngineResult<Self> {
        config.validate()?;
        let store = Arc::new(store);
        let images = Arc::new(images);
        let settings = Arc::new(settings);
        Ok(Self {
            builder: SnapshotBuilder::new(
                Arc::clone(&store),
                Arc::clone(&images),
                Arc::clone(&settings),
            ),
            applier: RestoreApplier::new(store, images, settings),
            codec: PayloadCodec::new(),
            transport,
            config,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        })
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Returns cumulative statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the configuration this engine runs with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Verifies the endpoint is reachable with the configured credentials.
    ///
    /// Creates the backup collection when the server is reachable but
    /// the collection does not exist yet.
    pub fn test_connection(&self) -> SyncResult {
        match self.transport.exists("") {
            Ok(true) => SyncResult::ok("Connection successful"),
            Ok(false) => match self.transport.ensure_directory("") {
                Ok(()) => SyncResult::ok("Connection successful, backup directory created"),
                Err(err) => SyncResult::failed(err.classify()),
            },
            Err(err) => SyncResult::failed(err.classify()),
        }
    }

    /// Uploads a full backup unconditionally, overwriting the remote.
    pub fn upload(&self) -> SyncResult {
        self.run(Self::run_upload)
    }

    /// Downloads the remote backup and applies it locally.
    pub fn download(&self) -> SyncResult {
        self.run(Self::run_download)
    }

    /// Syncs in the direction the conflict rule picks.
    ///
    /// Resolves the remote manifest, compares stamps, and transfers in
    /// exactly one direction, or not at all when both sides match.
    pub fn bidirectional_sync(&self) -> SyncResult {
        self.run(Self::run_bidirectional)
    }

    /// Uploads only the sections that changed since the last upload.
    ///
    /// A no-op when the remote manifest already matches the local
    /// snapshot.
    pub fn incremental_upload(&self) -> SyncResult {
        self.run(Self::run_incremental)
    }

    fn run(&self, op: fn(&Self) -> EngineResult<Outcome>) -> SyncResult {
        if let Err(err) = self.begin() {
            return SyncResult::failed(err.classify());
        }

        match op(self) {
            Ok(outcome) => {
                *self.state.write() = SyncState::Completed;
                self.finish_ok(outcome)
            }
            Err(err) => {
                *self.state.write() = SyncState::Failed;
                self.finish_err(&err);
                SyncResult::failed(err.classify())
            }
        }
    }

    fn begin(&self) -> EngineResult<()> {
        let mut state = self.state.write();
        if state.is_active() {
            return Err(SyncError::SyncInProgress);
        }
        *state = SyncState::ResolvingManifest;
        Ok(())
    }

    fn finish_ok(&self, outcome: Outcome) -> SyncResult {
        let result = match outcome {
            Outcome::Uploaded { details } => SyncResult::ok_with_details("Backup uploaded", details),
            Outcome::Downloaded { details } => {
                SyncResult::ok_with_details("Backup downloaded", details)
            }
            Outcome::NoOp => SyncResult::ok("Already in sync"),
        };

        let mut stats = self.stats.write();
        stats.runs_completed += 1;
        stats.last_error = None;
        if let Some(details) = &result.details {
            stats.prompts_uploaded += details.prompts_uploaded as u64;
            stats.prompts_downloaded += details.prompts_downloaded as u64;
        }
        result
    }

    fn finish_err(&self, err: &SyncError) {
        let mut stats = self.stats.write();
        stats.runs_failed += 1;
        stats.last_error = Some(err.to_string());
    }

    fn run_upload(&self) -> EngineResult<Outcome> {
        let snapshot = self.builder.build(&self.config)?;
        *self.state.write() = SyncState::Uploading;

        let details = if self.config.incremental_sync {
            self.push_snapshot(&snapshot, DATA_FILE, None)?
        } else {
            self.push_snapshot(&snapshot, BACKUP_FILE, None)?
        };
        Ok(Outcome::Uploaded { details })
    }

    fn run_download(&self) -> EngineResult<Outcome> {
        *self.state.write() = SyncState::Downloading;

        let manifest = self.remote_manifest()?;
        let payload = self.fetch_remote_payload(manifest.as_ref())?;
        let applied = self.applier.apply(&payload)?;
        Ok(Outcome::Downloaded {
            details: SyncDetails {
                prompts_downloaded: applied.prompts,
                images_downloaded: applied.images_written,
                ..SyncDetails::default()
            },
        })
    }

    fn run_bidirectional(&self) -> EngineResult<Outcome> {
        let snapshot = self.builder.build(&self.config)?;
        let comparison = resolve_manifest(&self.transport, MANIFEST_FILE, &snapshot)?;

        let direction = decide(snapshot.local_latest, comparison.remote.as_ref());
        info!("sync direction: {:?}", direction);

        match direction {
            SyncDirection::Upload => {
                *self.state.write() = SyncState::Uploading;
                let details = if self.config.incremental_sync {
                    self.push_snapshot(&snapshot, DATA_FILE, Some(&comparison.changed_sections))?
                } else {
                    self.push_snapshot(&snapshot, BACKUP_FILE, None)?
                };
                Ok(Outcome::Uploaded { details })
            }
            SyncDirection::Download => {
                *self.state.write() = SyncState::Downloading;
                let payload = self.fetch_remote_payload(comparison.remote.as_ref())?;
                let applied = self.applier.apply(&payload)?;
                Ok(Outcome::Downloaded {
                    details: SyncDetails {
                        prompts_downloaded: applied.prompts,
                        images_downloaded: applied.images_written,
                        ..SyncDetails::default()
                    },
                })
            }
            SyncDirection::NoOp => Ok(Outcome::NoOp),
        }
    }

    fn run_incremental(&self) -> EngineResult<Outcome> {
        let snapshot = self.builder.build(&self.config)?;
        let comparison = resolve_manifest(&self.transport, MANIFEST_FILE, &snapshot)?;

        if comparison.unchanged() {
            return Ok(Outcome::NoOp);
        }

        let names: Vec<&str> = comparison.changed_sections.iter().map(Section::as_str).collect();
        info!("incremental upload of changed sections: {}", names.join(", "));
        *self.state.write() = SyncState::Uploading;
        let details = self.push_snapshot(&snapshot, DATA_FILE, Some(&comparison.changed_sections))?;
        Ok(Outcome::Uploaded { details })
    }

    /// Writes the payload file, then the manifest describing it.
    ///
    /// The order is the crash-safety contract: a manifest must never
    /// describe payload bytes that did not land. When `partial` is
    /// given, sections outside it are dropped from the payload; the
    /// manifest always carries the full fingerprint set.
    fn push_snapshot(
        &self,
        snapshot: &Snapshot,
        file: &str,
        partial: Option<&[Section]>,
    ) -> EngineResult<SyncDetails> {
        self.transport.ensure_directory("")?;

        let mut payload = snapshot.payload.clone();
        if let Some(sections) = partial {
            payload.retain_sections(sections);
        }

        let bytes = self.codec.encode(&payload, self.config.passphrase())?;
        self.transport.put(file, &bytes)?;

        let manifest_bytes = snapshot.manifest.to_json_bytes()?;
        self.transport.put(MANIFEST_FILE, &manifest_bytes)?;

        Ok(SyncDetails {
            prompts_uploaded: payload.prompts.len(),
            images_uploaded: payload.images.as_ref().map_or(0, |images| images.len()),
            ..SyncDetails::default()
        })
    }

    /// Reads the remote manifest as a restore hint.
    ///
    /// A missing or unreadable manifest does not block a restore; the
    /// payload files alone then decide what gets applied.
    fn remote_manifest(&self) -> EngineResult<Option<BackupManifest>> {
        match self.transport.get(MANIFEST_FILE) {
            Ok(bytes) => match BackupManifest::from_json_bytes(&bytes) {
                Ok(manifest) => Ok(Some(manifest)),
                Err(err) => {
                    warn!("ignoring unreadable remote manifest: {}", err);
                    Ok(None)
                }
            },
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn read_payload_file(&self, file: &str) -> EngineResult<Option<BackupPayload>> {
        match self.transport.get(file) {
            Ok(bytes) => Ok(Some(self.codec.decode(&bytes, self.config.passphrase())?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetches and decodes the remote payload.
    ///
    /// With a manifest, the incremental-layout file is preferred only
    /// while its stamp matches the manifest's: a device that switches
    /// sync modes leaves the previous layout's file behind, and the
    /// manifest names the payload that actually landed last. Without a
    /// manifest the whole-payload file is authoritative. Either way the
    /// other layout is the fallback, so both uploader shapes restore
    /// through one path.
    fn fetch_remote_payload(
        &self,
        manifest: Option<&BackupManifest>,
    ) -> EngineResult<BackupPayload> {
        let (primary, secondary) = match manifest {
            Some(_) => (DATA_FILE, BACKUP_FILE),
            None => (BACKUP_FILE, DATA_FILE),
        };

        let first = self.read_payload_file(primary)?;

        if let (Some(manifest), Some(payload)) = (manifest, &first) {
            if payload.exported_at != manifest.exported_at {
                warn!("{} does not match the manifest stamp, checking {}", primary, secondary);
                if let Some(other) = self.read_payload_file(secondary)? {
                    if other.exported_at == manifest.exported_at
                        || other.exported_at > payload.exported_at
                    {
                        return Ok(other);
                    }
                }
            }
        }

        match first {
            Some(payload) => Ok(payload),
            None => self
                .read_payload_file(secondary)?
                .ok_or_else(|| SyncError::not_found(BACKUP_FILE)),
        }
    }
}
