//! Key-encrypting-key providers.
//!
//! A provider owns long-lived key material and only ever uses it to
//! wrap and unwrap short-lived data keys.  The file-backed provider
//! (`file`) is the baseline; `ring` routes unwraps across several
//! providers by key identifier so retired keys stay usable.

pub mod file;
pub mod ring;

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::errors::{Result, SealError};

pub use file::FileKek;
pub use ring::KekRing;

/// A data key encrypted under a KEK, plus the identifier of that KEK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    /// `nonce || ciphertext + tag` of the data key.
    pub wrapped: Vec<u8>,
    /// Identifier of the KEK that produced `wrapped`.
    pub kid: String,
}

/// Wraps and unwraps data-encryption keys.
///
/// Implementations must be safe to call from many threads at once and
/// must never expose their key material through return values or errors.
pub trait KekProvider: Send + Sync {
    /// Identifier of the key `wrap` currently uses.
    fn kid(&self) -> &str;

    /// Encrypt `dek` under the current key.
    fn wrap(&self, dek: &[u8]) -> Result<WrappedKey>;

    /// Reverse `wrap`.
    ///
    /// An empty `kid` means "the current key".  A non-empty `kid` that
    /// the provider does not own is a `KeyMismatch`.
    fn unwrap(&self, wrapped: &[u8], kid: &str) -> Result<Zeroizing<Vec<u8>>>;
}

impl<T> KekProvider for Arc<T>
where
    T: KekProvider + ?Sized,
{
    fn kid(&self) -> &str {
        (**self).kid()
    }

    fn wrap(&self, dek: &[u8]) -> Result<WrappedKey> {
        (**self).wrap(dek)
    }

    fn unwrap(&self, wrapped: &[u8], kid: &str) -> Result<Zeroizing<Vec<u8>>> {
        (**self).unwrap(wrapped, kid)
    }
}

impl<T> KekProvider for Box<T>
where
    T: KekProvider + ?Sized,
{
    fn kid(&self) -> &str {
        (**self).kid()
    }

    fn wrap(&self, dek: &[u8]) -> Result<WrappedKey> {
        (**self).wrap(dek)
    }

    fn unwrap(&self, wrapped: &[u8], kid: &str) -> Result<Zeroizing<Vec<u8>>> {
        (**self).unwrap(wrapped, kid)
    }
}

/// Single-key providers use this to refuse foreign key identifiers.
pub(crate) fn check_kid(own: &str, requested: &str) -> Result<()> {
    if !requested.is_empty() && requested != own {
        return Err(SealError::KeyMismatch {
            have: own.to_string(),
            want: requested.to_string(),
        });
    }
    Ok(())
}
