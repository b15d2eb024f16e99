//! Local collaborator traits and in-memory test implementations.
//!
//! The engine never touches application storage directly. The host
//! application injects implementations of these traits, which keeps
//! the engine portable across storage backends and lets tests run
//! against the in-memory versions below.

use crate::error::{EngineResult, SyncError};
use parking_lot::RwLock;
use prompthub_sync_protocol::{AiConfig, Folder, Prompt, PromptVersion, UserSettings};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Read and write access to the prompt database.
pub trait LocalStore: Send + Sync {
    /// Returns every prompt in the store.
    fn export_prompts(&self) -> EngineResult<Vec<Prompt>>;

    /// Returns every folder in the store.
    fn export_folders(&self) -> EngineResult<Vec<Folder>>;

    /// Returns every saved prompt version in the store.
    fn export_versions(&self) -> EngineResult<Vec<PromptVersion>>;

    /// Writes prompts, replacing any existing record with the same id.
    fn import_prompts(&self, prompts: &[Prompt]) -> EngineResult<()>;

    /// Writes folders, replacing any existing record with the same id.
    fn import_folders(&self, folders: &[Folder]) -> EngineResult<()>;

    /// Writes versions, replacing any existing record with the same id.
    fn import_versions(&self, versions: &[PromptVersion]) -> EngineResult<()>;
}

/// Access to image files referenced by prompts.
pub trait ImageStore: Send + Sync {
    /// Reads an image by file name.
    fn read(&self, name: &str) -> EngineResult<Vec<u8>>;

    /// Writes an image by file name, replacing any existing file.
    fn write(&self, name: &str, bytes: &[u8]) -> EngineResult<()>;
}

/// Read access to application settings.
pub trait SettingsReader: Send + Sync {
    /// Returns the AI provider configuration, if any is stored.
    fn ai_config(&self) -> EngineResult<Option<AiConfig>>;

    /// Returns the user settings, if any are stored.
    fn settings(&self) -> EngineResult<Option<UserSettings>>;
}

/// Write access to application settings.
pub trait SettingsWriter: Send + Sync {
    /// Stores the AI provider configuration.
    fn write_ai_config(&self, config: &AiConfig) -> EngineResult<()>;

    /// Stores the user settings.
    fn write_settings(&self, settings: &UserSettings) -> EngineResult<()>;
}

impl<T: LocalStore + ?Sized> LocalStore for Arc<T> {
    fn export_prompts(&self) -> EngineResult<Vec<Prompt>> {
        (**self).export_prompts()
    }

    fn export_folders(&self) -> EngineResult<Vec<Folder>> {
        (**self).export_folders()
    }

    fn export_versions(&self) -> EngineResult<Vec<PromptVersion>> {
        (**self).export_versions()
    }

    fn import_prompts(&self, prompts: &[Prompt]) -> EngineResult<()> {
        (**self).import_prompts(prompts)
    }

    fn import_folders(&self, folders: &[Folder]) -> EngineResult<()> {
        (**self).import_folders(folders)
    }

    fn import_versions(&self, versions: &[PromptVersion]) -> EngineResult<()> {
        (**self).import_versions(versions)
    }
}

impl<T: ImageStore + ?Sized> ImageStore for Arc<T> {
    fn read(&self, name: &str) -> EngineResult<Vec<u8>> {
        (**self).read(name)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        (**self).write(name, bytes)
    }
}

impl<T: SettingsReader + ?Sized> SettingsReader for Arc<T> {
    fn ai_config(&self) -> EngineResult<Option<AiConfig>> {
        (**self).ai_config()
    }

    fn settings(&self) -> EngineResult<Option<UserSettings>> {
        (**self).settings()
    }
}

impl<T: SettingsWriter + ?Sized> SettingsWriter for Arc<T> {
    fn write_ai_config(&self, config: &AiConfig) -> EngineResult<()> {
        (**self).write_ai_config(config)
    }

    fn write_settings(&self, settings: &UserSettings) -> EngineResult<()> {
        (**self).write_settings(settings)
    }
}

/// In-memory prompt database for tests.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    prompts: RwLock<BTreeMap<String, Prompt>>,
    folders: RwLock<BTreeMap<String, Folder>>,
    versions: RwLock<BTreeMap<String, PromptVersion>>,
}

impl MemoryLocalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a prompt directly.
    pub fn insert_prompt(&self, prompt: Prompt) {
        self.prompts.write().insert(prompt.id.clone(), prompt);
    }

    /// Inserts a folder directly.
    pub fn insert_folder(&self, folder: Folder) {
        self.folders.write().insert(folder.id.clone(), folder);
    }

    /// Inserts a prompt version directly.
    pub fn insert_version(&self, version: PromptVersion) {
        self.versions.write().insert(version.id.clone(), version);
    }

    /// Returns a prompt by id.
    pub fn prompt(&self, id: &str) -> Option<Prompt> {
        self.prompts.read().get(id).cloned()
    }

    /// Returns the number of stored prompts.
    pub fn prompt_count(&self) -> usize {
        self.prompts.read().len()
    }

    /// Returns the number of stored folders.
    pub fn folder_count(&self) -> usize {
        self.folders.read().len()
    }
}

impl LocalStore for MemoryLocalStore {
    fn export_prompts(&self) -> EngineResult<Vec<Prompt>> {
        Ok(self.prompts.read().values().cloned().collect())
    }

    fn export_folders(&self) -> EngineResult<Vec<Folder>> {
        Ok(self.folders.read().values().cloned().collect())
    }

    fn export_versions(&self) -> EngineResult<Vec<PromptVersion>> {
        Ok(self.versions.read().values().cloned().collect())
    }

    fn import_prompts(&self, prompts: &[Prompt]) -> EngineResult<()> {
        let mut stored = self.prompts.write();
        for prompt in prompts {
            stored.insert(prompt.id.clone(), prompt.clone());
        }
        Ok(())
    }

    fn import_folders(&self, folders: &[Folder]) -> EngineResult<()> {
        let mut stored = self.folders.write();
        for folder in folders {
            stored.insert(folder.id.clone(), folder.clone());
        }
        Ok(())
    }

    fn import_versions(&self, versions: &[PromptVersion]) -> EngineResult<()> {
        let mut stored = self.versions.write();
        for version in versions {
            stored.insert(version.id.clone(), version.clone());
        }
        Ok(())
    }
}

/// In-memory image files for tests.
///
/// Individual file names can be marked unreadable to exercise the
/// non-fatal image failure paths.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_on: RwLock<BTreeSet<String>>,
}

impl MemoryImageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an image directly.
    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.images.write().insert(name.to_string(), bytes);
    }

    /// Marks a file name as failing on both read and write.
    pub fn fail_access(&self, name: &str) {
        self.fail_on.write().insert(name.to_string());
    }

    /// Returns a stored image by file name.
    pub fn image(&self, name: &str) -> Option<Vec<u8>> {
        self.images.read().get(name).cloned()
    }

    /// Returns the number of stored images.
    pub fn image_count(&self) -> usize {
        self.images.read().len()
    }
}

impl ImageStore for MemoryImageStore {
    fn read(&self, name: &str) -> EngineResult<Vec<u8>> {
        if self.fail_on.read().contains(name) {
            return Err(SyncError::store(format!("image {name} is unreadable")));
        }
        self.images
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::store(format!("image {name} does not exist")))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        if self.fail_on.read().contains(name) {
            return Err(SyncError::store(format!("image {name} is unwritable")));
        }
        self.images.write().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// In-memory settings for tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    ai_config: RwLock<Option<AiConfig>>,
    settings: RwLock<Option<UserSettings>>,
}

impl MemorySettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored AI configuration.
    pub fn set_ai_config(&self, config: AiConfig) {
        *self.ai_config.write() = Some(config);
    }

    /// Replaces the stored user settings.
    pub fn set_settings(&self, settings: UserSettings) {
        *self.settings.write() = Some(settings);
    }
}

impl SettingsReader for MemorySettingsStore {
    fn ai_config(&self) -> EngineResult<Option<AiConfig>> {
        Ok(self.ai_config.read().clone())
    }

    fn settings(&self) -> EngineResult<Option<UserSettings>> {
        Ok(self.settings.read().clone())
    }
}

impl SettingsWriter for MemorySettingsStore {
    fn write_ai_config(&self, config: &AiConfig) -> EngineResult<()> {
        *self.ai_config.write() = Some(config.clone());
        Ok(())
    }

    fn write_settings(&self, settings: &UserSettings) -> EngineResult<()> {
        *self.settings.write() = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn prompt(id: &str) -> Prompt {
        Prompt {
            id: id.to_string(),
            title: format!("Prompt {id}"),
            content: "content".to_string(),
            folder_id: None,
            tags: Vec::new(),
            images: Vec::new(),
            favorite: false,
            created_at: t(1),
            updated_at: t(1),
        }
    }

    #[test]
    fn import_replaces_by_id() {
        let store = MemoryLocalStore::new();
        store.insert_prompt(prompt("p1"));

        let mut updated = prompt("p1");
        updated.title = "Renamed".to_string();
        store.import_prompts(&[updated, prompt("p2")]).unwrap();

        assert_eq!(store.prompt_count(), 2);
        assert_eq!(store.prompt("p1").unwrap().title, "Renamed");
    }

    #[test]
    fn export_is_ordered_by_id() {
        let store = MemoryLocalStore::new();
        store.insert_prompt(prompt("b"));
        store.insert_prompt(prompt("a"));

        let ids: Vec<String> = store
            .export_prompts()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn image_store_reports_failures() {
        let images = MemoryImageStore::new();
        images.insert("a.png", vec![1, 2, 3]);
        images.fail_access("b.png");
        images.insert("b.png", vec![4]);

        assert_eq!(images.read("a.png").unwrap(), vec![1, 2, 3]);
        assert!(images.read("b.png").is_err());
        assert!(images.read("missing.png").is_err());
    }

    #[test]
    fn settings_store_roundtrips() {
        let settings = MemorySettingsStore::new();
        assert!(settings.ai_config().unwrap().is_none());

        let config = AiConfig {
            provider: Some("openai".to_string()),
            ..AiConfig::default()
        };
        settings.write_ai_config(&config).unwrap();
        assert_eq!(
            settings.ai_config().unwrap().unwrap().provider.as_deref(),
            Some("openai")
        );
    }
}
