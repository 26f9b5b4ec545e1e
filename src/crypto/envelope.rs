//! Envelope encryption.
//!
//! Every plaintext gets its own random data key (DEK) and nonce.  The
//! DEK encrypts the value, the KEK provider wraps the DEK, and the DEK
//! itself is wiped as soon as the call returns.  Rotating the KEK
//! therefore only means re-wrapping DEKs (`Envelope::rewrap`), never
//! re-encrypting values.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::encryption::{self, KEY_LEN};
use super::kek::{KekProvider, WrappedKey};
use crate::errors::{Result, SealError};

/// Everything needed to recover one plaintext, given the right KEK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBundle {
    /// `nonce || ciphertext + tag`, sealed under the DEK.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,

    /// The DEK, sealed under the KEK named by `kid`.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_dek: Vec<u8>,

    /// Identifier of the KEK that wrapped the DEK.
    pub kid: String,
}

/// Stateless encryptor built around a KEK provider.
pub struct Envelope<P> {
    kek: P,
}

impl<P: KekProvider> Envelope<P> {
    pub fn new(kek: P) -> Self {
        Self { kek }
    }

    /// The KEK provider in use.
    pub fn provider(&self) -> &P {
        &self.kek
    }

    /// Encrypt `plaintext` under a fresh DEK and wrap that DEK.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<CiphertextBundle> {
        let dek = encryption::generate_key();
        let ciphertext = encryption::seal(dek.as_ref(), plaintext)?;
        let WrappedKey { wrapped, kid } = self.kek.wrap(dek.as_ref())?;

        Ok(CiphertextBundle {
            ciphertext,
            wrapped_dek: wrapped,
            kid,
        })
    }

    /// Recover the plaintext of a bundle produced by `encrypt`.
    ///
    /// Unwrap errors (`KeyMismatch`, `CorruptInput`) pass through as-is.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        wrapped_dek: &[u8],
        kid: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let dek = self.kek.unwrap(wrapped_dek, kid)?;
        if dek.len() != KEY_LEN {
            return Err(SealError::CorruptInput(format!(
                "unwrapped data key is {} bytes, expected {KEY_LEN}",
                dek.len()
            )));
        }

        encryption::open(&dek, ciphertext).map(Zeroizing::new)
    }

    /// Convenience wrapper around `decrypt` for a whole bundle.
    pub fn open_bundle(&self, bundle: &CiphertextBundle) -> Result<Zeroizing<Vec<u8>>> {
        self.decrypt(&bundle.ciphertext, &bundle.wrapped_dek, &bundle.kid)
    }

    /// Re-wrap a DEK under the provider's current KEK.
    ///
    /// The DEK is recovered with `kid`, so the provider must still hold
    /// that key (see `KekRing`).  The ciphertext it protects is untouched.
    pub fn rewrap(&self, wrapped_dek: &[u8], kid: &str) -> Result<WrappedKey> {
        let dek = self.kek.unwrap(wrapped_dek, kid)?;
        self.kek.wrap(&dek)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
