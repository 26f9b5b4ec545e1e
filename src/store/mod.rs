//! Store module — versioned, append-only storage of ciphertext bundles.
//!
//! This module provides:
//! - Version types and identifier generation (`version`)
//! - A SQLite-backed durable store (`sqlite`)
//! - An in-memory store for tests and embedding (`memory`)

pub mod memory;
pub mod sqlite;
pub mod version;

use std::sync::Arc;

use crate::errors::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use version::{NewVersion, SecretVersion, VersionMetadata, VersionSelector, LATEST};

/// Durable storage for secret versions.
///
/// Stores never see plaintext and never read the clock: the bundle and
/// its creation time arrive fully formed in `NewVersion`.
pub trait SecretStore: Send + Sync {
    /// Append a version under `path`, creating the path if needed.
    ///
    /// Returns the version identifier (generated when not supplied).
    fn put(&self, path: &str, version: NewVersion) -> Result<String>;

    /// Fetch one version.  `""` and `"latest"` select the newest one.
    fn get(&self, path: &str, version: &str) -> Result<SecretVersion>;

    /// Metadata for every version of `path`, newest first.
    fn list_versions(&self, path: &str) -> Result<Vec<VersionMetadata>>;

    /// Remove `path` and all of its versions.  Returns how many versions
    /// were removed.
    fn delete_path(&self, path: &str) -> Result<usize>;

    /// Every known path, sorted.
    fn list_paths(&self) -> Result<Vec<String>>;
}

impl<T> SecretStore for Arc<T>
where
    T: SecretStore + ?Sized,
{
    fn put(&self, path: &str, version: NewVersion) -> Result<String> {
        (**self).put(path, version)
    }

    fn get(&self, path: &str, version: &str) -> Result<SecretVersion> {
        (**self).get(path, version)
    }

    fn list_versions(&self, path: &str) -> Result<Vec<VersionMetadata>> {
        (**self).list_versions(path)
    }

    fn delete_path(&self, path: &str) -> Result<usize> {
        (**self).delete_path(path)
    }

    fn list_paths(&self) -> Result<Vec<String>> {
        (**self).list_paths()
    }
}
