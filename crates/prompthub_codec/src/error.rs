//! Error types for the payload codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a backup payload.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload is encrypted and no passphrase was supplied.
    #[error("payload is encrypted and requires a passphrase")]
    PassphraseRequired,

    /// Authentication failed: wrong passphrase or corrupted data.
    #[error("decryption failed: wrong passphrase or corrupted data")]
    DecryptionFailed,

    /// Encryption could not be performed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Error message.
        message: String,
    },

    /// The byte stream is not a recognizable payload container.
    #[error("unsupported container format: {message}")]
    UnsupportedFormat {
        /// Error message.
        message: String,
    },

    /// JSON serialization or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol-level validation failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] prompthub_sync_protocol::ProtocolError),
}

impl CodecError {
    /// Creates an encryption failure.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an unsupported-format error.
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            CodecError::PassphraseRequired.to_string(),
            "payload is encrypted and requires a passphrase"
        );
        assert_eq!(
            CodecError::unsupported_format("unknown container version 9").to_string(),
            "unsupported container format: unknown container version 9"
        );
    }
}
