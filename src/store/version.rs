//! Secret version types and version identifier generation.
//!
//! Versions are append-only: a `NewVersion` goes in through
//! `SecretStore::put`, a `SecretVersion` comes back out of `get`, and
//! nothing in between is ever updated in place.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::CiphertextBundle;
use crate::errors::{Result, SealError};

/// Version selector that resolves to the most recent version.
pub const LATEST: &str = "latest";

/// A version about to be written.
#[derive(Debug, Clone)]
pub struct NewVersion {
    /// Caller-chosen identifier; the store generates one when `None`.
    pub version_id: Option<String>,

    /// The encrypted value.
    pub bundle: CiphertextBundle,

    /// Creation time, always supplied by the caller.
    pub created_at: DateTime<Utc>,
}

impl NewVersion {
    /// A version with a store-generated identifier.
    pub fn new(bundle: CiphertextBundle, created_at: DateTime<Utc>) -> Self {
        Self {
            version_id: None,
            bundle,
            created_at,
        }
    }

    /// Use an explicit version identifier instead of a generated one.
    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }
}

/// A stored version, as returned by `SecretStore::get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretVersion {
    pub path: String,
    pub version_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub bundle: CiphertextBundle,
}

/// Lightweight metadata about a version (no ciphertext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMetadata {
    pub version_id: String,
    pub kid: String,
    pub created_at: DateTime<Utc>,
}

/// How a `get` picks its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector<'a> {
    Latest,
    Exact(&'a str),
}

impl<'a> VersionSelector<'a> {
    /// `""` and `"latest"` both mean the newest version.
    pub fn parse(version: &'a str) -> Self {
        if version.is_empty() || version == LATEST {
            Self::Latest
        } else {
            Self::Exact(version)
        }
    }

    /// Human-readable form for errors and logs.
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Latest => LATEST,
            Self::Exact(v) => v,
        }
    }
}

/// Validate a secret path.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SealError::InvalidPath("path cannot be empty".into()));
    }
    Ok(())
}

/// Validate an explicitly supplied version identifier.
///
/// `""` and `"latest"` are selectors, so a version with either name
/// could never be read back by exact match.
pub fn validate_version_id(version_id: &str) -> Result<()> {
    if version_id.is_empty() || version_id == LATEST {
        return Err(SealError::InvalidVersion(version_id.to_string()));
    }
    Ok(())
}

/// Hands out timestamp-derived version identifiers.
///
/// Each identifier is the creation time in nanoseconds since the Unix
/// epoch, bumped when needed so it is strictly greater than the last one
/// handed out by this generator.
#[derive(Debug, Default)]
pub struct VersionIdGenerator {
    last: AtomicU64,
}

impl VersionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier for a version created at `created_at`.
    pub fn next(&self, created_at: DateTime<Utc>) -> String {
        let nanos = created_at
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);

        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(nanos.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);

        nanos.max(previous.saturating_add(1)).to_string()
    }
}

/// Maximum attempts when a generated identifier collides with an
/// existing row (e.g. written by another process at the same instant).
const MAX_ID_ATTEMPTS: usize = 8;

/// Run `insert` with the version's identifier, generating one if needed.
///
/// Collisions on a generated identifier are retried with a fresh one;
/// a collision on an explicit identifier is returned as-is.
pub(crate) fn insert_with_id<F>(
    ids: &VersionIdGenerator,
    version: &NewVersion,
    mut insert: F,
) -> Result<String>
where
    F: FnMut(&str) -> Result<()>,
{
    if let Some(explicit) = &version.version_id {
        validate_version_id(explicit)?;
        insert(explicit)?;
        return Ok(explicit.clone());
    }

    let mut last_err = None;
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.next(version.created_at);
        match insert(&id) {
            Ok(()) => return Ok(id),
            Err(e @ SealError::DuplicateVersion { .. }) => last_err = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        SealError::BackendUnavailable("could not allocate a version id".into())
    }))
}
