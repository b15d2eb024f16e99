//! The transferable backup payload.

use crate::error::{ProtocolError, ProtocolResult};
use crate::manifest::Section;
use crate::records::{AiConfig, Folder, Prompt, PromptVersion, UserSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest payload schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 2;

/// The full exportable snapshot of application data.
///
/// A payload is built fresh for every upload; nothing is cached between
/// runs. `exported_at` equals the latest local modification instant and
/// is the authoritative comparison key for conflict resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    /// Payload schema version.
    pub version: u32,
    /// Latest local modification instant at build time.
    pub exported_at: DateTime<Utc>,
    /// Prompt records, sorted by id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<Prompt>,
    /// Folder records, sorted by id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<Folder>,
    /// Version history records, sorted by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<PromptVersion>>,
    /// Generated images, file name to base64 content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<BTreeMap<String, String>>,
    /// AI provider configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_config: Option<AiConfig>,
    /// User preference snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<UserSettings>,
}

impl BackupPayload {
    /// Creates an empty payload stamped with `exported_at`.
    pub fn new(exported_at: DateTime<Utc>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            exported_at,
            prompts: Vec::new(),
            folders: Vec::new(),
            versions: None,
            images: None,
            ai_config: None,
            settings: None,
        }
    }

    /// Fails fast when the payload declares a newer schema than this build.
    pub fn check_version(&self) -> ProtocolResult<()> {
        if self.version > SCHEMA_VERSION {
            return Err(ProtocolError::unsupported_version(
                self.version,
                SCHEMA_VERSION,
            ));
        }
        Ok(())
    }

    /// Returns the latest modification instant across all contained data.
    ///
    /// Covers prompt and folder `updated_at` plus the settings stamp;
    /// version history is immutable and does not participate. `None`
    /// means the payload carries no timestamped data at all.
    pub fn latest_updated_at(&self) -> Option<DateTime<Utc>> {
        let prompts = self.prompts.iter().map(|p| p.updated_at);
        let folders = self.folders.iter().map(|f| f.updated_at);
        let settings = self.settings.as_ref().and_then(|s| s.settings_updated_at);
        prompts.chain(folders).chain(settings).max()
    }

    /// Drops every section not listed in `keep`.
    ///
    /// Used to assemble partial payloads for incremental uploads; dropped
    /// sections are omitted from the JSON entirely.
    pub fn retain_sections(&mut self, keep: &[Section]) {
        if !keep.contains(&Section::Prompts) {
            self.prompts.clear();
        }
        if !keep.contains(&Section::Folders) {
            self.folders.clear();
        }
        if !keep.contains(&Section::Versions) {
            self.versions = None;
        }
        if !keep.contains(&Section::Images) {
            self.images = None;
        }
        if !keep.contains(&Section::AiConfig) {
            self.ai_config = None;
        }
        if !keep.contains(&Section::Settings) {
            self.settings = None;
        }
    }
}
