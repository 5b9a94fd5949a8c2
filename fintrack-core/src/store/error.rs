use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::crypto::CryptoError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or unusable encryption key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Ciphertext failed verification: tampered file or wrong key.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Payload is neither a valid document nor valid ciphertext.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("storage error for {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<CryptoError> for StoreError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Configuration(msg) => StoreError::Configuration(msg),
            CryptoError::Authentication(msg) => StoreError::Authentication(msg),
            CryptoError::Malformed(msg) => StoreError::CorruptData(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
