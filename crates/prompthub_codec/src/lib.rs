//! # PromptHub Codec
//!
//! Backup payload encoding and passphrase encryption for PromptHub sync.
//!
//! This crate provides:
//! - `PayloadCodec` for the JSON wire container
//! - The `Cipher` trait with the default PBKDF2 + AES-256-GCM scheme
//! - A deterministic `FixedCipher` for tests
//!
//! Plaintext payloads travel as bare JSON. Encrypted payloads carry the
//! `PHBK` magic followed by
//! `format_version || salt || nonce || ciphertext || tag`, and always
//! fail closed: a bad authentication tag surfaces as `DecryptionFailed`,
//! never as garbage data.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod codec;
mod error;

pub use cipher::{
    Aes256GcmCipher, Cipher, EncryptionKey, FixedCipher, KEY_SIZE, NONCE_SIZE, PBKDF2_ITERATIONS,
    SALT_SIZE, TAG_SIZE,
};
pub use codec::{is_encrypted, PayloadCodec, ENCRYPTION_MAGIC, FORMAT_VERSION};
pub use error::{CodecError, CodecResult};
