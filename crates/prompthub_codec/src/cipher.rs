//! Passphrase-based encryption using PBKDF2 and AES-256-GCM.

use crate::error::{CodecError, CodecResult};
use aes_gcm::{
    aead::{Aead, KeyInit, generic_array::GenericArray},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the KDF salt in bytes.
pub const SALT_SIZE: usize = 16;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// PBKDF2-HMAC-SHA256 iteration count for passphrase key derivation.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Encryption key derived from the user's passphrase.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this method - don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Symmetric encryption scheme used by the payload codec.
///
/// The scheme sits behind a trait so it stays swappable and tests can
/// use deterministic salts and nonces.
pub trait Cipher: Send + Sync {
    /// Derives an encryption key from a passphrase and salt.
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> EncryptionKey;

    /// Generates a fresh KDF salt.
    fn generate_salt(&self) -> [u8; SALT_SIZE];

    /// Encrypts `plaintext`, returning `nonce || ciphertext || tag`.
    fn encrypt(&self, key: &EncryptionKey, plaintext: &[u8]) -> CodecResult<Vec<u8>>;

    /// Decrypts data produced by [`encrypt`](Cipher::encrypt).
    fn decrypt(&self, key: &EncryptionKey, ciphertext: &[u8]) -> CodecResult<Vec<u8>>;
}

/// The default cipher: PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes256GcmCipher;

impl Aes256GcmCipher {
    /// Creates the default cipher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Cipher for Aes256GcmCipher {
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> EncryptionKey {
        let mut bytes = [0u8; KEY_SIZE];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut bytes);
        EncryptionKey::from_bytes(bytes)
    }

    fn generate_salt(&self) -> [u8; SALT_SIZE] {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        salt
    }

    fn encrypt(&self, key: &EncryptionKey, plaintext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CodecError::encryption_failed("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);
        Ok(result)
    }

    fn decrypt(&self, key: &EncryptionKey, ciphertext: &[u8]) -> CodecResult<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CodecError::DecryptionFailed);
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        let nonce = Nonce::from_slice(&ciphertext[..NONCE_SIZE]);

        cipher
            .decrypt(nonce, &ciphertext[NONCE_SIZE..])
            .map_err(|_| CodecError::DecryptionFailed)
    }
}

/// A cipher with fixed salt and nonce for deterministic test vectors.
///
/// Key derivation runs a single PBKDF2 round, so containers produced
/// here only decode through this cipher, never the default one.
#[derive(Debug, Clone)]
pub struct FixedCipher {
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
}

impl FixedCipher {
    /// Creates a cipher that always uses `salt` and `nonce`.
    #[must_use]
    pub fn new(salt: [u8; SALT_SIZE], nonce: [u8; NONCE_SIZE]) -> Self {
        Self { salt, nonce }
    }
}

impl Cipher for FixedCipher {
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> EncryptionKey {
        let mut bytes = [0u8; KEY_SIZE];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, 1, &mut bytes);
        EncryptionKey::from_bytes(bytes)
    }

    fn generate_salt(&self) -> [u8; SALT_SIZE] {
        self.salt
    }

    fn encrypt(&self, key: &EncryptionKey, plaintext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        let nonce = Nonce::from_slice(&self.nonce);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CodecError::encryption_failed("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&self.nonce);
        result.extend(ciphertext);
        Ok(result)
    }

    fn decrypt(&self, key: &EncryptionKey, ciphertext: &[u8]) -> CodecResult<Vec<u8>> {
        Aes256GcmCipher.decrypt(key, ciphertext)
    }
}
