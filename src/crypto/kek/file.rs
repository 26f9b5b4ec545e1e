//! File-backed key-encrypting key.
//!
//! The KEK is a 32-byte random file.  Its identifier is
//! `file://<absolute path>`, so it stays stable across restarts as long
//! as the file does not move.
//!
//! A file of the wrong length is a fatal configuration error.  It is
//! never regenerated in place: every data key wrapped by the old
//! contents would become undecryptable.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{check_kid, KekProvider, WrappedKey};
use crate::crypto::encryption::{self, KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::errors::{Result, SealError};

/// URI scheme used for file-backed key identifiers.
const KID_SCHEME: &str = "file://";

/// A KEK loaded from (or generated into) a file on disk.
pub struct FileKek {
    key: Zeroizing<[u8; KEY_LEN]>,
    kid: String,
    path: PathBuf,
}

impl FileKek {
    /// Load the KEK at `path`, generating it first if the file is absent.
    pub fn open(path: &Path) -> Result<Self> {
        let path = absolute(path)?;
        match read_key(&path)? {
            Some(key) => Ok(Self::from_parts(path, key)),
            None => match Self::create(&path) {
                Ok(kek) => Ok(kek),
                // Another process won the race to create it; use theirs.
                Err(SealError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                    Self::load(&path)
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Generate a brand-new KEK at `path`.  Fails if the file exists.
    pub fn generate(path: &Path) -> Result<Self> {
        let path = absolute(path)?;
        Self::create(&path).map_err(|e| match e {
            SealError::Io(io) if io.kind() == ErrorKind::AlreadyExists => {
                SealError::InvalidKeyMaterial {
                    path: path.clone(),
                    reason: "key file already exists".into(),
                }
            }
            other => other,
        })
    }

    /// Load an existing KEK.  Fails if the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let path = absolute(path)?;
        match read_key(&path)? {
            Some(key) => Ok(Self::from_parts(path, key)),
            None => Err(SealError::InvalidKeyMaterial {
                path,
                reason: "key file not found".into(),
            }),
        }
    }

    /// Absolute path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short SHA-256 fingerprint of the key, safe to print or log.
    pub fn fingerprint(&self) -> String {
        fingerprint(self.key.as_ref())
    }

    fn from_parts(path: PathBuf, key: Zeroizing<[u8; KEY_LEN]>) -> Self {
        let kid = format!("{KID_SCHEME}{}", path.display());
        Self { key, kid, path }
    }

    fn create(path: &Path) -> Result<Self> {
        let key = encryption::generate_key();

        let parent = path.parent().ok_or_else(|| SealError::InvalidKeyMaterial {
            path: path.to_path_buf(),
            reason: "key file path has no parent directory".into(),
        })?;
        if !parent.exists() {
            create_private_dir(parent)?;
        }

        // Complete key under a temporary name, then linked into place
        // without overwriting.
        let mut tmp = tempfile::Builder::new()
            .prefix(".kek-")
            .tempfile_in(parent)?;

        // On Unix, restrict permissions to owner-only read/write.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        tmp.write_all(key.as_ref())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(path).map_err(|e| SealError::Io(e.error))?;

        let kek = Self::from_parts(path.to_path_buf(), key);
        tracing::warn!(
            kid = %kek.kid,
            fingerprint = %kek.fingerprint(),
            "generated new key-encrypting key"
        );
        Ok(kek)
    }
}

impl KekProvider for FileKek {
    fn kid(&self) -> &str {
        &self.kid
    }

    fn wrap(&self, dek: &[u8]) -> Result<WrappedKey> {
        let wrapped = encryption::seal(self.key.as_ref(), dek)?;
        Ok(WrappedKey {
            wrapped,
            kid: self.kid.clone(),
        })
    }

    fn unwrap(&self, wrapped: &[u8], kid: &str) -> Result<Zeroizing<Vec<u8>>> {
        check_kid(&self.kid, kid)?;

        if wrapped.len() < NONCE_LEN + TAG_LEN {
            return Err(SealError::CorruptInput(format!(
                "wrapped key is {} bytes, need at least {}",
                wrapped.len(),
                NONCE_LEN + TAG_LEN
            )));
        }

        encryption::open(self.key.as_ref(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| SealError::CorruptInput("wrapped key failed integrity check".into()))
    }
}

impl fmt::Debug for FileKek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileKek")
            .field("kid", &self.kid)
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Read and validate the key file.  `Ok(None)` means it does not exist.
fn read_key(path: &Path) -> Result<Option<Zeroizing<[u8; KEY_LEN]>>> {
    let data = match fs::read(path) {
        Ok(data) => Zeroizing::new(data),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SealError::BackendUnavailable(format!(
                "cannot read key file {}: {e}",
                path.display()
            )))
        }
    };

    if data.len() != KEY_LEN {
        return Err(SealError::InvalidKeyMaterial {
            path: path.to_path_buf(),
            reason: format!("key file must be exactly {KEY_LEN} bytes, got {}", data.len()),
        });
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&data);
    Ok(Some(key))
}

fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    Ok(())
}

/// Absolute, lexically normalized form of `path`.
///
/// `.` components are dropped and `..` pops its parent, so every spelling
/// of the same file yields the same key identifier.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

fn fingerprint(key: &[u8]) -> String {
    Sha256::digest(key)
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}
