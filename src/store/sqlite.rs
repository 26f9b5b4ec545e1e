//! SQLite-backed `SecretStore`.
//!
//! Schema:
//!
//! ```text
//! secrets  (path PRIMARY KEY)
//! versions (id AUTOINCREMENT, version_id, path -> secrets ON DELETE CASCADE,
//!           ciphertext, wrapped_dek, kek_id, created_at_ns)
//! ```
//!
//! `(path, version_id)` is unique and `(path, created_at_ns DESC, id DESC)`
//! is indexed for "latest" lookups.  Every call opens its own connection
//! with a busy timeout, so a locked database fails the call with
//! `BackendUnavailable` instead of hanging it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use super::version::{
    insert_with_id, validate_path, NewVersion, SecretVersion, VersionIdGenerator,
    VersionMetadata, VersionSelector,
};
use super::SecretStore;
use crate::crypto::CiphertextBundle;
use crate::errors::{Result, SealError};

/// Default bound on how long a call waits for a locked database.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS secrets (
        path TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS versions (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        version_id    TEXT NOT NULL,
        path          TEXT NOT NULL REFERENCES secrets(path) ON DELETE CASCADE,
        ciphertext    BLOB NOT NULL,
        wrapped_dek   BLOB NOT NULL,
        kek_id        TEXT NOT NULL,
        created_at_ns INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS versions_path_created_idx
        ON versions(path, created_at_ns DESC, id DESC);

    CREATE UNIQUE INDEX IF NOT EXISTS versions_path_version_idx
        ON versions(path, version_id);
";

const SELECT_VERSION: &str =
    "SELECT version_id, ciphertext, wrapped_dek, kek_id, created_at_ns FROM versions";

/// A `SecretStore` persisted in a SQLite database file.
pub struct SqliteStore {
    db_path: PathBuf,
    timeout: Duration,
    ids: VersionIdGenerator,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub fn open(db_path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            db_path: db_path.to_path_buf(),
            timeout,
            ids: VersionIdGenerator::new(),
        };

        // The file exists with owner-only permissions before SQLite first
        // opens it; SQLite gives its -wal and -shm files the same mode.
        create_private_file(&store.db_path)?;
        let conn = store.connect()?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| backend("enable WAL", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| backend("schema migration", e))?;
        restrict_permissions(&store.db_path)?;

        tracing::debug!(db = %store.db_path.display(), "opened secret store");
        Ok(store)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).map_err(|e| backend("open database", e))?;
        conn.busy_timeout(self.timeout)
            .map_err(|e| backend("set busy timeout", e))?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| backend("enable foreign keys", e))?;
        Ok(conn)
    }

    fn insert(&self, path: &str, version_id: &str, version: &NewVersion) -> Result<()> {
        let created_at_ns = to_nanos(version.created_at)?;
        let mut conn = self.connect()?;

        // IMMEDIATE takes the write lock up front, so two first writes to
        // the same new path queue behind each other instead of racing.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| backend("begin transaction", e))?;

        tx.execute(
            "INSERT OR IGNORE INTO secrets (path) VALUES (?1)",
            params![path],
        )
        .map_err(|e| backend("ensure path", e))?;

        tx.execute(
            "INSERT INTO versions (version_id, path, ciphertext, wrapped_dek, kek_id, created_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                version_id,
                path,
                version.bundle.ciphertext,
                version.bundle.wrapped_dek,
                version.bundle.kid,
                created_at_ns,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                SealError::DuplicateVersion {
                    path: path.to_string(),
                    version: version_id.to_string(),
                }
            } else {
                backend("insert version", e)
            }
        })?;

        tx.commit().map_err(|e| backend("commit", e))
    }

    fn path_exists(conn: &Connection, path: &str) -> Result<bool> {
        conn.query_row(
            "SELECT 1 FROM secrets WHERE path = ?1",
            params![path],
            |_| Ok(()),
        )
        .optional()
        .map(|row| row.is_some())
        .map_err(|e| backend("lookup path", e))
    }
}

impl SecretStore for SqliteStore {
    fn put(&self, path: &str, version: NewVersion) -> Result<String> {
        validate_path(path)?;
        let id = insert_with_id(&self.ids, &version, |id| self.insert(path, id, &version))?;
        tracing::debug!(path, version = %id, "stored secret version");
        Ok(id)
    }

    fn get(&self, path: &str, version: &str) -> Result<SecretVersion> {
        let selector = VersionSelector::parse(version);
        let conn = self.connect()?;

        let row = match selector {
            VersionSelector::Latest => conn
                .query_row(
                    &format!(
                        "{SELECT_VERSION} WHERE path = ?1 ORDER BY created_at_ns DESC, id DESC LIMIT 1"
                    ),
                    params![path],
                    read_row,
                )
                .optional(),
            VersionSelector::Exact(id) => conn
                .query_row(
                    &format!("{SELECT_VERSION} WHERE path = ?1 AND version_id = ?2"),
                    params![path, id],
                    read_row,
                )
                .optional(),
        }
        .map_err(|e| backend("select version", e))?;

        let (version_id, bundle, created_at_ns) =
            row.ok_or_else(|| SealError::not_found(path, selector.as_str()))?;

        Ok(SecretVersion {
            path: path.to_string(),
            version_id,
            created_at: DateTime::from_timestamp_nanos(created_at_ns),
            bundle,
        })
    }

    fn list_versions(&self, path: &str) -> Result<Vec<VersionMetadata>> {
        let conn = self.connect()?;
        if !Self::path_exists(&conn, path)? {
            return Err(SealError::not_found(path, "*"));
        }

        let mut stmt = conn
            .prepare(
                "SELECT version_id, kek_id, created_at_ns FROM versions
                 WHERE path = ?1
                 ORDER BY created_at_ns DESC, id DESC",
            )
            .map_err(|e| backend("list prepare", e))?;

        let rows = stmt
            .query_map(params![path], |row| {
                Ok(VersionMetadata {
                    version_id: row.get(0)?,
                    kid: row.get(1)?,
                    created_at: DateTime::from_timestamp_nanos(row.get(2)?),
                })
            })
            .map_err(|e| backend("list exec", e))?;

        let mut versions = Vec::new();
        for row in rows {
            versions.push(row.map_err(|e| backend("list row", e))?);
        }
        Ok(versions)
    }

    fn delete_path(&self, path: &str) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| backend("begin transaction", e))?;

        let count: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM versions WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .map_err(|e| backend("count versions", e))?;

        let removed = tx
            .execute("DELETE FROM secrets WHERE path = ?1", params![path])
            .map_err(|e| backend("delete path", e))?;
        if removed == 0 {
            return Err(SealError::not_found(path, "*"));
        }

        tx.commit().map_err(|e| backend("commit", e))?;
        tracing::debug!(path, versions = count, "deleted secret path");
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn list_paths(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT path FROM secrets ORDER BY path")
            .map_err(|e| backend("paths prepare", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| backend("paths exec", e))?;

        let mut paths = Vec::new();
        for row in rows {
            paths.push(row.map_err(|e| backend("paths row", e))?);
        }
        Ok(paths)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, CiphertextBundle, i64)> {
    Ok((
        row.get(0)?,
        CiphertextBundle {
            ciphertext: row.get(1)?,
            wrapped_dek: row.get(2)?,
            kid: row.get(3)?,
        },
        row.get(4)?,
    ))
}

fn to_nanos(ts: DateTime<Utc>) -> Result<i64> {
    ts.timestamp_nanos_opt().ok_or_else(|| {
        SealError::Serialization(format!("timestamp {ts} is outside the storable range"))
    })
}

/// Only the `(path, version_id)` unique index means "duplicate version".
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Create `path` as an empty owner-only file unless it already exists.
fn create_private_file(path: &Path) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?;
    Ok(())
}

/// Force owner-only permissions on the database and any sidecar files
/// left by an earlier process.
fn restrict_permissions(db_path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut files = vec![db_path.to_path_buf()];
        for suffix in ["-wal", "-shm"] {
            let mut name = db_path.as_os_str().to_owned();
            name.push(suffix);
            files.push(PathBuf::from(name));
        }
        for file in files.iter().filter(|f| f.exists()) {
            std::fs::set_permissions(file, std::fs::Permissions::from_mode(0o600))?;
        }
    }
    #[cfg(not(unix))]
    let _ = db_path;
    Ok(())
}

/// Every driver failure is a backend failure from the caller's view.
fn backend(context: &str, e: rusqlite::Error) -> SealError {
    SealError::BackendUnavailable(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(&dir.path().join("secrets.db"), DEFAULT_TIMEOUT).unwrap()
    }

    fn bundle(tag: u8) -> CiphertextBundle {
        CiphertextBundle {
            ciphertext: vec![tag; 40],
            wrapped_dek: vec![tag; 60],
            kid: "file:///tmp/kek.bin".into(),
        }
    }

    #[test]
    fn open_creates_database() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        assert!(s.db_path().exists());
    }

    #[test]
    fn latest_prefers_newest_timestamp_over_insertion_order() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let early = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let late = Utc.timestamp_opt(1_700_000_500, 0).unwrap();

        s.put("p", NewVersion::new(bundle(1), late).with_version_id("late")).unwrap();
        s.put("p", NewVersion::new(bundle(2), early).with_version_id("early")).unwrap();

        assert_eq!(s.get("p", "").unwrap().version_id, "late");
    }

    #[test]
    fn identical_timestamps_resolve_by_insertion_order() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        s.put("p", NewVersion::new(bundle(1), t).with_version_id("first")).unwrap();
        s.put("p", NewVersion::new(bundle(2), t).with_version_id("second")).unwrap();

        assert_eq!(s.get("p", "latest").unwrap().version_id, "second");
    }

    #[test]
    fn timestamps_roundtrip_with_nanosecond_precision() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let t = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

        let id = s.put("p", NewVersion::new(bundle(1), t)).unwrap();
        assert_eq!(s.get("p", &id).unwrap().created_at, t);
    }

    #[test]
    fn delete_cascades_to_versions() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        s.put("a", NewVersion::new(bundle(1), t)).unwrap();
        s.put("a", NewVersion::new(bundle(2), t)).unwrap();
        s.put("b", NewVersion::new(bundle(3), t)).unwrap();

        assert_eq!(s.delete_path("a").unwrap(), 2);

        let conn = s.connect().unwrap();
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM versions WHERE path = 'a'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(s.list_paths().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn only_unique_violations_are_duplicates() {
        let unique = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            None,
        );
        let foreign_key = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            None,
        );
        assert!(is_unique_violation(&unique));
        assert!(!is_unique_violation(&foreign_key));
    }

    #[test]
    fn foreign_key_failure_is_a_backend_error() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let conn = s.connect().unwrap();

        let err = conn
            .execute(
                "INSERT INTO versions (version_id, path, ciphertext, wrapped_dek, kek_id, created_at_ns)
                 VALUES ('v1', 'no-such-path', x'00', x'00', 'k', 0)",
                [],
            )
            .unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[cfg(unix)]
    #[test]
    fn wal_sidecars_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.put("p", NewVersion::new(bundle(1), Utc::now())).unwrap();

        // Hold a writing connection so the sidecars stay on disk.
        let conn = s.connect().unwrap();
        conn.execute("INSERT OR IGNORE INTO secrets (path) VALUES ('held')", [])
            .unwrap();

        for suffix in ["-wal", "-shm"] {
            let sidecar = dir.path().join(format!("secrets.db{suffix}"));
            let mode = std::fs::metadata(&sidecar).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{suffix} should be 0o600");
        }
    }

    #[cfg(unix)]
    #[test]
    fn database_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let s = store(&dir);

        let perms = std::fs::metadata(s.db_path()).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "database should be 0o600");
    }
}
