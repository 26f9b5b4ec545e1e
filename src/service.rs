//! High-level secret operations used by the CLI.
//!
//! `SecretService` joins the envelope encryptor to a store so callers
//! work with plaintext in and plaintext out:
//! `service.put("db/password", b"s3cr3t")`.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::crypto::{Envelope, KekProvider};
use crate::errors::Result;
use crate::store::{NewVersion, SecretStore, VersionMetadata};

/// Source of "now" for new versions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A decrypted secret value.  The plaintext is wiped on drop.
pub struct RevealedSecret {
    pub value: Zeroizing<Vec<u8>>,
    pub version_id: String,
    pub created_at: DateTime<Utc>,
}

impl RevealedSecret {
    /// The value as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// Encrypting front-end over a `SecretStore`.
pub struct SecretService<P, S, C = SystemClock> {
    envelope: Envelope<P>,
    store: S,
    clock: C,
}

impl<P, S> SecretService<P, S, SystemClock>
where
    P: KekProvider,
    S: SecretStore,
{
    pub fn new(kek: P, store: S) -> Self {
        Self::with_clock(kek, store, SystemClock)
    }
}

impl<P, S, C> SecretService<P, S, C>
where
    P: KekProvider,
    S: SecretStore,
    C: Clock,
{
    pub fn with_clock(kek: P, store: S, clock: C) -> Self {
        Self {
            envelope: Envelope::new(kek),
            store,
            clock,
        }
    }

    pub fn envelope(&self) -> &Envelope<P> {
        &self.envelope
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt `value` and append it as a new version of `path`.
    pub fn put(&self, path: &str, value: &[u8]) -> Result<String> {
        self.store_version(path, value, None)
    }

    /// Like `put`, but with a caller-chosen version identifier.
    pub fn put_with_version(&self, path: &str, value: &[u8], version_id: &str) -> Result<String> {
        self.store_version(path, value, Some(version_id))
    }

    /// Fetch and decrypt a version of `path` (`""`/`"latest"` for newest).
    pub fn get(&self, path: &str, version: &str) -> Result<RevealedSecret> {
        let stored = self.store.get(path, version)?;
        let value = self.envelope.open_bundle(&stored.bundle).map_err(|e| {
            tracing::warn!(path, version = %stored.version_id, error = %e, "failed to decrypt secret");
            e
        })?;

        tracing::debug!(path, version = %stored.version_id, "read secret");
        Ok(RevealedSecret {
            value,
            version_id: stored.version_id,
            created_at: stored.created_at,
        })
    }

    /// Version metadata for `path`, newest first.
    pub fn versions(&self, path: &str) -> Result<Vec<VersionMetadata>> {
        self.store.list_versions(path)
    }

    /// Remove `path` and every version under it.
    pub fn delete(&self, path: &str) -> Result<usize> {
        let removed = self.store.delete_path(path)?;
        tracing::info!(path, versions = removed, "deleted secret");
        Ok(removed)
    }

    /// Every known path.
    pub fn paths(&self) -> Result<Vec<String>> {
        self.store.list_paths()
    }

    fn store_version(&self, path: &str, value: &[u8], version_id: Option<&str>) -> Result<String> {
        crate::store::version::validate_path(path)?;

        let bundle = self.envelope.encrypt(value)?;
        let mut version = NewVersion::new(bundle, self.clock.now());
        if let Some(id) = version_id {
            version = version.with_version_id(id);
        }

        let id = self.store.put(path, version)?;
        tracing::info!(path, version = %id, "stored secret");
        Ok(id)
    }
}
