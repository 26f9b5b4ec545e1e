use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in sealstore.
#[derive(Debug, Error)]
pub enum SealError {
    // --- Store errors ---
    #[error("Invalid secret path: {0}")]
    InvalidPath(String),

    #[error("Secret '{path}' not found (version: {version})")]
    NotFound { path: String, version: String },

    #[error("Invalid version identifier '{0}'")]
    InvalidVersion(String),

    #[error("Version '{version}' already exists for '{path}'")]
    DuplicateVersion { path: String, version: String },

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    // --- Key errors ---
    #[error("Key mismatch: active key is {have}, data was wrapped by {want}")]
    KeyMismatch { have: String, want: String },

    #[error("Corrupt input: {0}")]
    CorruptInput(String),

    #[error("Invalid key material at {path}: {reason}")]
    InvalidKeyMaterial { path: PathBuf, reason: String },

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Ciphertext too short ({0} bytes)")]
    TooShort(usize),

    #[error("Authentication failed: ciphertext was tampered with or the key is wrong")]
    AuthenticationFailure,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl SealError {
    /// Shorthand for a `NotFound` on `path` at `version`.
    pub fn not_found(path: &str, version: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
            version: version.to_string(),
        }
    }

    /// Only a backend outage is worth retrying; everything else is a
    /// data-integrity or caller error that a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    /// Failures an API layer should not tell apart: a missing secret and a
    /// secret that exists but cannot be opened.
    pub fn is_opaque(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::KeyMismatch { .. }
                | Self::CorruptInput(_)
                | Self::TooShort(_)
                | Self::AuthenticationFailure
        )
    }
}

/// Convenience type alias for sealstore results.
pub type Result<T> = std::result::Result<T, SealError>;
