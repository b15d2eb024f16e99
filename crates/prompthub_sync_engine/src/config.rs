//! Sync engine configuration.

use crate::error::{EngineResult, SyncError};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a sync engine instance.
///
/// The endpoint is the WebDAV collection URL that holds the backup
/// files, e.g. `https://dav.example.com/remote.php/dav/files/user/PromptHub`.
#[derive(Clone)]
pub struct SyncConfig {
    /// WebDAV collection URL.
    pub endpoint: String,
    /// Basic Auth username.
    pub username: String,
    /// Basic Auth password or app token.
    pub password: String,
    /// Optional passphrase for payload encryption.
    ///
    /// When set, uploads are encrypted and downloads require the same
    /// passphrase. The manifest is never encrypted.
    pub encryption_passphrase: Option<String>,
    /// Whether prompt images are included in backups.
    pub include_images: bool,
    /// Whether uploads use the incremental file layout.
    pub incremental_sync: bool,
    /// Stable identifier for this device, sent with every request.
    pub client_id: String,
    /// Timeout applied to each HTTP request.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with default options.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            encryption_passphrase: None,
            include_images: true,
            incremental_sync: false,
            client_id: Uuid::new_v4().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the encryption passphrase.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.encryption_passphrase = Some(passphrase.into());
        self
    }

    /// Sets whether images are included in backups.
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }

    /// Sets whether uploads use the incremental file layout.
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental_sync = incremental;
        self
    }

    /// Sets the device identifier sent with every request.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the passphrase when one is configured and non-empty.
    ///
    /// An empty string counts as no passphrase, so a cleared settings
    /// field cannot silently encrypt backups with "".
    pub fn passphrase(&self) -> Option<&str> {
        self.encryption_passphrase.as_deref().filter(|p| !p.is_empty())
    }

    /// Validates the configuration contract.
    pub fn validate(&self) -> EngineResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::invalid_config("endpoint must not be empty"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(SyncError::invalid_config(
                "endpoint must be an http:// or https:// URL",
            ));
        }
        if self.username.trim().is_empty() {
            return Err(SyncError::invalid_config("username must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field(
                "encryption_passphrase",
                &self.encryption_passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .field("include_images", &self.include_images)
            .field("incremental_sync", &self.incremental_sync)
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
