//! Backup payload container encoding.

use crate::cipher::{Aes256GcmCipher, Cipher, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{CodecError, CodecResult};
use prompthub_sync_protocol::BackupPayload;

/// Magic prefix marking an encrypted payload container.
pub const ENCRYPTION_MAGIC: [u8; 4] = *b"PHBK";
/// Version of the encrypted container format.
pub const FORMAT_VERSION: u8 = 1;

const SALT_OFFSET: usize = ENCRYPTION_MAGIC.len() + 1;
const NONCE_OFFSET: usize = SALT_OFFSET + SALT_SIZE;
const MIN_CONTAINER_LEN: usize = NONCE_OFFSET + NONCE_SIZE + TAG_SIZE;

/// Returns true if `bytes` carry the encrypted container magic.
///
/// Plaintext payloads are JSON documents and always start with `{`, so
/// the magic never collides with an unencrypted payload.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.starts_with(&ENCRYPTION_MAGIC)
}

/// Encodes and decodes backup payloads, optionally passphrase-encrypted.
///
/// Plaintext payloads are bare canonical JSON. Encrypted payloads are
/// `magic(4) || format_version(1) || salt(16) || nonce(12) || ciphertext || tag(16)`.
#[derive(Debug, Default, Clone)]
pub struct PayloadCodec<C: Cipher = Aes256GcmCipher> {
    cipher: C,
}

impl PayloadCodec {
    /// Creates a codec using the default AES-256-GCM cipher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cipher: Aes256GcmCipher::new(),
        }
    }
}

impl<C: Cipher> PayloadCodec<C> {
    /// Creates a codec over a specific cipher implementation.
    pub fn with_cipher(cipher: C) -> Self {
        Self { cipher }
    }

    /// Serializes `payload`, encrypting when a passphrase is supplied.
    pub fn encode(
        &self,
        payload: &BackupPayload,
        passphrase: Option<&str>,
    ) -> CodecResult<Vec<u8>> {
        let json = serde_json::to_vec(payload)?;

        let passphrase = match passphrase {
            Some(p) => p,
            None => return Ok(json),
        };

        let salt = self.cipher.generate_salt();
        let key = self.cipher.derive_key(passphrase, &salt);
        let sealed = self.cipher.encrypt(&key, &json)?;

        let mut out = Vec::with_capacity(SALT_OFFSET + salt.len() + sealed.len());
        out.extend_from_slice(&ENCRYPTION_MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&salt);
        out.extend(sealed);
        Ok(out)
    }

    /// Parses payload bytes, decrypting when they carry the container magic.
    ///
    /// An encrypted payload without a passphrase fails with
    /// [`CodecError::PassphraseRequired`]; a failed authentication tag
    /// fails with [`CodecError::DecryptionFailed`] rather than returning
    /// garbage. The schema version is checked after parsing and a payload
    /// newer than this build fails fast.
    pub fn decode(&self, bytes: &[u8], passphrase: Option<&str>) -> CodecResult<BackupPayload> {
        let json = if is_encrypted(bytes) {
            let passphrase = passphrase.ok_or(CodecError::PassphraseRequired)?;
            self.open_container(bytes, passphrase)?
        } else {
            bytes.to_vec()
        };

        let payload: BackupPayload = serde_json::from_slice(&json)?;
        payload.check_version()?;
        Ok(payload)
    }

    fn open_container(&self, bytes: &[u8], passphrase: &str) -> CodecResult<Vec<u8>> {
        if bytes.len() < MIN_CONTAINER_LEN {
            return Err(CodecError::unsupported_format("container too short"));
        }

        let version = bytes[ENCRYPTION_MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(CodecError::unsupported_format(format!(
                "unknown container version {version}"
            )));
        }

        let salt = &bytes[SALT_OFFSET..NONCE_OFFSET];
        let key = self.cipher.derive_key(passphrase, salt);
        self.cipher.decrypt(&key, &bytes[NONCE_OFFSET..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::FixedCipher;
    use chrono::{DateTime, TimeZone, Utc};
    use prompthub_sync_protocol::{Prompt, ProtocolError, SCHEMA_VERSION};
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn test_codec() -> PayloadCodec<FixedCipher> {
        PayloadCodec::with_cipher(FixedCipher::new([7u8; SALT_SIZE], [9u8; NONCE_SIZE]))
    }

    fn prompt(id: &str, content: &str, updated: i64) -> Prompt {
        Prompt {
            id: id.into(),
            title: format!("prompt {id}"),
            content: content.into(),
            folder_id: None,
            tags: Vec::new(),
            images: Vec::new(),
            favorite: false,
            created_at: t(0),
            updated_at: t(updated),
        }
    }

    fn sample_payload() -> BackupPayload {
        let mut payload = BackupPayload::new(t(1000));
        payload.prompts = vec![prompt("p1", "say hello", 1000)];
        payload
    }

    #[test]
    fn plaintext_roundtrip() {
        let codec = test_codec();
        let payload = sample_payload();

        let bytes = codec.encode(&payload, None).unwrap();
        assert!(bytes.starts_with(b"{"));
        assert!(!is_encrypted(&bytes));

        let decoded = codec.decode(&bytes, None).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn encrypted_roundtrip() {
        let codec = test_codec();
        let payload = sample_payload();

        let bytes = codec.encode(&payload, Some("secret")).unwrap();
        assert!(is_encrypted(&bytes));
        assert_eq!(bytes[4], FORMAT_VERSION);

        let decoded = codec.decode(&bytes, Some("secret")).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn encrypted_roundtrip_with_default_cipher() {
        let codec = PayloadCodec::new();
        let payload = sample_payload();

        let bytes = codec.encode(&payload, Some("secret")).unwrap();
        let decoded = codec.decode(&bytes, Some("secret")).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn missing_passphrase_is_required_error() {
        let codec = test_codec();
        let bytes = codec.encode(&sample_payload(), Some("secret")).unwrap();

        assert!(matches!(
            codec.decode(&bytes, None),
            Err(CodecError::PassphraseRequired)
        ));
    }

    #[test]
    fn wrong_passphrase_fails_decryption() {
        let codec = test_codec();
        let bytes = codec.encode(&sample_payload(), Some("secret")).unwrap();

        assert!(matches!(
            codec.decode(&bytes, Some("not the passphrase")),
            Err(CodecError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let codec = test_codec();
        let mut bytes = codec.encode(&sample_payload(), Some("secret")).unwrap();
        let len = bytes.len();
        bytes[len - 1] ^= 0xFF;

        assert!(matches!(
            codec.decode(&bytes, Some("secret")),
            Err(CodecError::DecryptionFailed)
        ));
    }

    #[test]
    fn truncated_container_is_rejected() {
        let codec = test_codec();
        let bytes = codec.encode(&sample_payload(), Some("secret")).unwrap();

        assert!(matches!(
            codec.decode(&bytes[..MIN_CONTAINER_LEN - 1], Some("secret")),
            Err(CodecError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn unknown_container_version_is_rejected() {
        let codec = test_codec();
        let mut bytes = codec.encode(&sample_payload(), Some("secret")).unwrap();
        bytes[ENCRYPTION_MAGIC.len()] = 9;

        assert!(matches!(
            codec.decode(&bytes, Some("secret")),
            Err(CodecError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_codec_error() {
        let codec = test_codec();
        assert!(matches!(
            codec.decode(b"not json at all", None),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn newer_schema_version_fails_fast() {
        let codec = test_codec();
        let mut payload = sample_payload();
        payload.version = SCHEMA_VERSION + 1;

        let bytes = codec.encode(&payload, None).unwrap();
        assert!(matches!(
            codec.decode(&bytes, None),
            Err(CodecError::Protocol(ProtocolError::UnsupportedVersion { .. }))
        ));
    }

    #[test]
    fn deterministic_cipher_yields_identical_containers() {
        let codec = test_codec();
        let payload = sample_payload();

        let a = codec.encode(&payload, Some("secret")).unwrap();
        let b = codec.encode(&payload, Some("secret")).unwrap();
        assert_eq!(a, b);
    }

    fn prompt_strategy() -> impl Strategy<Value = Prompt> {
        (
            "[a-z0-9]{1,12}",
            ".{0,40}",
            0i64..4_000_000_000,
        )
            .prop_map(|(id, content, secs)| prompt(&id, &content, secs))
    }

    fn payload_strategy() -> impl Strategy<Value = BackupPayload> {
        (prop::collection::vec(prompt_strategy(), 0..4), 0i64..4_000_000_000).prop_map(
            |(prompts, stamp)| {
                let mut payload = BackupPayload::new(t(stamp));
                payload.prompts = prompts;
                payload
            },
        )
    }

    proptest! {
        #[test]
        fn any_payload_roundtrips_encrypted(payload in payload_strategy()) {
            let codec = test_codec();
            let bytes = codec.encode(&payload, Some("property-secret")).unwrap();
            let decoded = codec.decode(&bytes, Some("property-secret")).unwrap();
            prop_assert_eq!(decoded, payload);
        }

        #[test]
        fn any_payload_with_a_wrong_passphrase_fails(payload in payload_strategy()) {
            let codec = test_codec();
            let bytes = codec.encode(&payload, Some("property-secret")).unwrap();
            let err = codec.decode(&bytes, Some("another-secret")).unwrap_err();
            prop_assert!(matches!(err, CodecError::DecryptionFailed));
        }
    }
}
