//! In-memory `SecretStore`.
//!
//! Same ordering and uniqueness rules as the SQLite store, kept in a
//! `HashMap` behind an `RwLock`.  Nothing survives the process.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::version::{
    insert_with_id, validate_path, NewVersion, SecretVersion, VersionIdGenerator,
    VersionMetadata, VersionSelector,
};
use super::SecretStore;
use crate::errors::{Result, SealError};

struct Row {
    seq: u64,
    version: SecretVersion,
}

#[derive(Default)]
struct Inner {
    paths: HashMap<String, Vec<Row>>,
    next_seq: u64,
}

/// A `SecretStore` that lives entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    ids: VersionIdGenerator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| SealError::BackendUnavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| SealError::BackendUnavailable("memory store lock poisoned".into()))
    }
}

impl SecretStore for MemoryStore {
    fn put(&self, path: &str, version: NewVersion) -> Result<String> {
        validate_path(path)?;

        insert_with_id(&self.ids, &version, |id| {
            let mut inner = self.write()?;
            let seq = inner.next_seq;
            let rows = inner.paths.entry(path.to_string()).or_default();

            if rows.iter().any(|r| r.version.version_id == id) {
                return Err(SealError::DuplicateVersion {
                    path: path.to_string(),
                    version: id.to_string(),
                });
            }

            rows.push(Row {
                seq,
                version: SecretVersion {
                    path: path.to_string(),
                    version_id: id.to_string(),
                    created_at: version.created_at,
                    bundle: version.bundle.clone(),
                },
            });
            inner.next_seq += 1;
            Ok(())
        })
    }

    fn get(&self, path: &str, version: &str) -> Result<SecretVersion> {
        let selector = VersionSelector::parse(version);
        let inner = self.read()?;
        let rows = inner
            .paths
            .get(path)
            .ok_or_else(|| SealError::not_found(path, selector.as_str()))?;

        let found = match selector {
            VersionSelector::Latest => rows
                .iter()
                .max_by_key(|r| (r.version.created_at, r.seq)),
            VersionSelector::Exact(id) => rows.iter().find(|r| r.version.version_id == id),
        };

        found
            .map(|r| r.version.clone())
            .ok_or_else(|| SealError::not_found(path, selector.as_str()))
    }

    fn list_versions(&self, path: &str) -> Result<Vec<VersionMetadata>> {
        let inner = self.read()?;
        let rows = inner
            .paths
            .get(path)
            .ok_or_else(|| SealError::not_found(path, "*"))?;

        let mut sorted: Vec<&Row> = rows.iter().collect();
        sorted.sort_by(|a, b| {
            (b.version.created_at, b.seq).cmp(&(a.version.created_at, a.seq))
        });

        Ok(sorted
            .into_iter()
            .map(|r| VersionMetadata {
                version_id: r.version.version_id.clone(),
                kid: r.version.bundle.kid.clone(),
                created_at: r.version.created_at,
            })
            .collect())
    }

    fn delete_path(&self, path: &str) -> Result<usize> {
        self.write()?
            .paths
            .remove(path)
            .map(|rows| rows.len())
            .ok_or_else(|| SealError::not_found(path, "*"))
    }

    fn list_paths(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self.read()?.paths.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}
