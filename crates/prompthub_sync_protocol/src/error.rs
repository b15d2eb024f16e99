//! Error types for the sync protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or validating protocol documents.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON serialization or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document declares a schema version newer than this build supports.
    #[error("unsupported schema version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },
}

impl ProtocolError {
    /// Creates an unsupported-version error.
    pub fn unsupported_version(found: u32, supported: u32) -> Self {
        Self::UnsupportedVersion { found, supported }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::unsupported_version(9, 2);
        assert_eq!(
            err.to_string(),
            "unsupported schema version 9 (supported up to 2)"
        );
    }

    #[test]
    fn json_error_conversion() {
        let bad = serde_json::from_slice::<u32>(b"not json");
        let err: ProtocolError = bad.unwrap_err().into();
        assert!(err.to_string().starts_with("json error"));
    }
}
