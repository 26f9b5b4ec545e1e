use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SealError};

/// Project-level configuration, loaded from `.sealstore.toml`.
///
/// Every field has a sensible default so sealstore works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Key-encrypting-key file (relative to the project root).
    #[serde(default = "default_kek_file")]
    pub kek_file: String,

    /// SQLite database holding the encrypted versions.
    #[serde(default = "default_database")]
    pub database: String,

    /// How long a store call may wait on a locked database, in ms.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Show the real cause of not-found and decryption failures instead
    /// of one opaque message.
    #[serde(default)]
    pub reveal_error_detail: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kek_file() -> String {
    ".sealstore/kek.bin".to_string()
}

fn default_database() -> String {
    ".sealstore/secrets.db".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            kek_file: default_kek_file(),
            database: default_database(),
            store_timeout_ms: default_store_timeout_ms(),
            reveal_error_detail: false,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".sealstore.toml";

    /// Load settings from `<project_dir>/.sealstore.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SealError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.store_timeout_ms == 0 {
            return Err(SealError::Config(
                "store_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(settings)
    }

    /// Resolve the KEK file against the project root.
    pub fn kek_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.kek_file)
    }

    /// Resolve the database file against the project root.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database)
    }

    /// Store timeout as a `Duration`.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
