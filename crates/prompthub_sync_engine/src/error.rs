//! Error types for the sync engine.

use prompthub_codec::CodecError;
use prompthub_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server rejected the configured credentials.
    #[error("authentication failed: {message}")]
    Auth {
        /// Error message.
        message: String,
    },

    /// A remote file does not exist.
    #[error("remote file not found: {path}")]
    NotFound {
        /// Remote path that was requested.
        path: String,
    },

    /// The transport failed below the HTTP status level.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// Payload encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A protocol-level contract was violated.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A local collaborator failed to read or write.
    #[error("local store error: {message}")]
    Store {
        /// Error message.
        message: String,
    },

    /// The configuration violates the engine contract.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// A sync run is already active on this engine.
    #[error("a sync operation is already in progress")]
    SyncInProgress,
}

impl SyncError {
    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    /// Creates a not-found error for a remote path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Creates a local store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    /// Returns true for authentication failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns true when a remote file was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Renders the error as a user-facing message.
    ///
    /// Sync operations report expected failures through `SyncResult`
    /// messages rather than raw error chains, so the wording here is
    /// what end users see.
    pub fn classify(&self) -> String {
        match self {
            Self::Auth { .. } => "Authentication failed: check username and password".to_string(),
            Self::NotFound { path } => format!("No remote backup found at {path}"),
            Self::Codec(CodecError::PassphraseRequired) => {
                "Backup is encrypted: an encryption passphrase is required".to_string()
            }
            Self::Codec(CodecError::DecryptionFailed) => {
                "Decryption failed: wrong passphrase or corrupted backup".to_string()
            }
            Self::Codec(err) => format!("Backup data error: {err}"),
            Self::Protocol(err) => format!("Backup data error: {err}"),
            Self::Transport { message } => format!("Connection failed: {message}"),
            Self::Store { message } => format!("Local data error: {message}"),
            Self::InvalidConfig { message } => format!("Invalid configuration: {message}"),
            Self::SyncInProgress => "A sync operation is already in progress".to_string(),
        }
    }
}
