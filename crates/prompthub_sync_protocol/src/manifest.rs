//! Backup manifest and section identifiers.

use crate::error::{ProtocolError, ProtocolResult};
use crate::fingerprint::section_fingerprints;
use crate::payload::{BackupPayload, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A logical section of the backup payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    /// Prompt records.
    Prompts,
    /// Folder records.
    Folders,
    /// Version history records.
    Versions,
    /// Generated images (file name to base64).
    Images,
    /// AI provider configuration.
    AiConfig,
    /// User preference snapshot.
    Settings,
}

impl Section {
    /// Every section, in fingerprint map order.
    pub const ALL: [Section; 6] = [
        Section::Prompts,
        Section::Folders,
        Section::Versions,
        Section::Images,
        Section::AiConfig,
        Section::Settings,
    ];

    /// Returns the wire name of the section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Prompts => "prompts",
            Section::Folders => "folders",
            Section::Versions => "versions",
            Section::Images => "images",
            Section::AiConfig => "aiConfig",
            Section::Settings => "settings",
        }
    }
}

/// Metadata describing the last uploaded payload.
///
/// The manifest carries fingerprints and the conflict-resolution stamp,
/// not user data, and is never encrypted. It is the only state that
/// survives between sync runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    /// Schema version of the described payload.
    pub version: u32,
    /// The described payload's `exported_at` stamp.
    pub exported_at: DateTime<Utc>,
    /// One fingerprint per logical section.
    pub section_fingerprints: BTreeMap<Section, String>,
}

impl BackupManifest {
    /// Builds the manifest describing `payload`.
    pub fn for_payload(payload: &BackupPayload) -> ProtocolResult<Self> {
        Ok(Self {
            version: payload.version,
            exported_at: payload.exported_at,
            section_fingerprints: section_fingerprints(payload)?,
        })
    }

    /// Returns the sections whose fingerprints differ from `remote`.
    ///
    /// A section missing on either side counts as changed; two sides
    /// both missing a section agree that it is unchanged.
    pub fn changed_sections(&self, remote: &BackupManifest) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| {
                self.section_fingerprints.get(section) != remote.section_fingerprints.get(section)
            })
            .collect()
    }

    /// Fails fast when the manifest declares a newer schema than this build.
    pub fn check_version(&self) -> ProtocolResult<()> {
        if self.version > SCHEMA_VERSION {
            return Err(ProtocolError::unsupported_version(
                self.version,
                SCHEMA_VERSION,
            ));
        }
        Ok(())
    }

    /// Serializes the manifest to its wire JSON bytes.
    pub fn to_json_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses manifest bytes, rejecting unsupported schema versions.
    pub fn from_json_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        manifest.check_version()?;
        Ok(manifest)
    }
}
