//! Encryption at rest for the document store.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call. Tokens are laid
//! out as:
//!
//! ```text
//! base64( nonce (12) | tag (16) | ciphertext )
//! ```
//!
//! The key is configured out of band as base64 of exactly 32 raw bytes.
//! A cipher with no key is a pass-through: `is_enabled()` reports false and
//! the store writes plaintext. Key validation happens on first use, so a bad
//! key never prevents construction.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use std::fmt;

/// Environment variable holding the base64-encoded data key.
pub const KEY_ENV: &str = "DATA_ENCRYPTION_KEY";

/// Raw key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes (96 bits, the GCM standard size).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Errors raised by [`DataCipher`].
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// No key, or key material that does not decode to 32 bytes.
    #[error("encryption configuration error: {0}")]
    Configuration(String),
    /// Tag verification failed or the token is truncated.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Input is not a token at all (not base64).
    #[error("malformed encrypted payload: {0}")]
    Malformed(String),
}

/// Symmetric cipher for the persisted document.
#[derive(Clone, Default)]
pub struct DataCipher {
    key_material: Option<String>,
}

impl fmt::Debug for DataCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCipher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl DataCipher {
    /// Creates a cipher from base64 key material. Blank material disables
    /// encryption.
    pub fn new(key_material: Option<String>) -> Self {
        let key_material = key_material
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self { key_material }
    }

    /// A pass-through cipher.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Reads key material from `DATA_ENCRYPTION_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(KEY_ENV).ok())
    }

    /// Creates a cipher from raw key bytes.
    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self::new(Some(STANDARD.encode(key)))
    }

    /// Generates new random key material, base64 encoded.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::rng().fill(&mut key);
        STANDARD.encode(key)
    }

    /// True when key material is configured.
    pub fn is_enabled(&self) -> bool {
        self.key_material.is_some()
    }

    fn key(&self) -> Result<[u8; KEY_LEN], CryptoError> {
        let material = self.key_material.as_deref().ok_or_else(|| {
            CryptoError::Configuration(format!("{} is not set", KEY_ENV))
        })?;

        let decoded = STANDARD.decode(material).map_err(|e| {
            CryptoError::Configuration(format!("{} is not valid base64: {}", KEY_ENV, e))
        })?;

        decoded.try_into().map_err(|bytes: Vec<u8>| {
            CryptoError::Configuration(format!(
                "{} must be base64 of {} bytes, got {} bytes",
                KEY_ENV,
                KEY_LEN,
                bytes.len()
            ))
        })
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        let key = self.key()?;
        Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::Configuration(e.to_string()))
    }

    /// Encrypts `plaintext` into a base64 token.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let cipher = self.cipher()?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|_| CryptoError::Malformed("plaintext too large to encrypt".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + buffer.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&tag);
        out.extend_from_slice(&buffer);

        Ok(STANDARD.encode(out))
    }

    /// Decrypts a token produced by [`DataCipher::encrypt`].
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.cipher()?;

        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|e| CryptoError::Malformed(e.to_string()))?;

        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Authentication(format!(
                "encrypted data too short ({} bytes)",
                bytes.len()
            )));
        }

        let (nonce, rest) = bytes.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                b"",
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| {
                CryptoError::Authentication(
                    "tag mismatch: data was modified or the key is wrong".to_string(),
                )
            })?;

        Ok(buffer)
    }
}
