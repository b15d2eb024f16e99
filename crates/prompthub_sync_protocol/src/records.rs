//! Typed records carried inside a backup payload.
//!
//! Every record type mirrors the JSON shape stored on the remote server.
//! Field names are camelCase on the wire; optional sections deserialize
//! leniently so older backups parse without loss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prompt record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Unique prompt ID.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Prompt body text.
    pub content: String,
    /// Containing folder, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// File names of generated images referenced by this prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Whether the prompt is pinned as a favorite.
    #[serde(default)]
    pub favorite: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A folder record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent folder, if nested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A saved historical version of a prompt.
///
/// Versions are immutable once written, so they carry no `updated_at`
/// and do not participate in the latest-modification calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    /// Unique version ID.
    pub id: String,
    /// The prompt this version belongs to.
    pub prompt_id: String,
    /// Body text at the time of the save.
    pub content: String,
    /// Optional user annotation for the save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Time the version was saved.
    pub created_at: DateTime<Utc>,
}

/// AI provider configuration.
///
/// Every field is optional; a restore only overwrites the fields a
/// backup actually carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// Provider name (e.g. "openai").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// API base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl AiConfig {
    /// Overwrites the fields present in `other`, keeping local values for
    /// fields the backup does not carry.
    pub fn merge_from(&mut self, other: &AiConfig) {
        if other.provider.is_some() {
            self.provider = other.provider.clone();
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base.clone();
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key.clone();
        }
        if other.model.is_some() {
            self.model = other.model.clone();
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
    }
}

/// User preference snapshot.
///
/// Like [`AiConfig`], every field is optional and restores merge
/// field-by-field so device-specific settings survive a download.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// UI theme name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// UI language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether automatic sync is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_sync: Option<bool>,
    /// Automatic sync interval in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_interval_minutes: Option<u32>,
    /// Last settings modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_updated_at: Option<DateTime<Utc>>,
}

impl UserSettings {
    /// Overwrites the fields present in `other`, keeping local values for
    /// fields the backup does not carry.
    pub fn merge_from(&mut self, other: &UserSettings) {
        if other.theme.is_some() {
            self.theme = other.theme.clone();
        }
        if other.language.is_some() {
            self.language = other.language.clone();
        }
        if other.auto_sync.is_some() {
            self.auto_sync = other.auto_sync;
        }
        if other.sync_interval_minutes.is_some() {
            self.sync_interval_minutes = other.sync_interval_minutes;
        }
        if other.settings_updated_at.is_some() {
            self.settings_updated_at = other.settings_updated_at;
        }
    }
}
