//! AES-256-GCM authenticated encryption.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `open` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! A new cipher instance is built on every call, so nothing here is
//! shared between threads.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{Result, SealError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Generate a fresh random 256-bit key, wiped from memory on drop.
pub fn generate_key() -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rand::rng().fill_bytes(key.as_mut());
    key
}

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SealError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| SealError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `seal`.
///
/// Fails with `TooShort` when there is not even a nonce to split off, and
/// with `AuthenticationFailure` when the tag does not verify.
pub fn open(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN {
        return Err(SealError::TooShort(ciphertext_with_nonce.len()));
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| SealError::AuthenticationFailure)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SealError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_key();
        let sealed = seal(key.as_ref(), b"hello").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 5 + TAG_LEN);
        assert_eq!(open(key.as_ref(), &sealed).unwrap(), b"hello");
    }

    #[test]
    fn open_rejects_less_than_a_nonce() {
        let key = generate_key();
        let err = open(key.as_ref(), &[0u8; 11]).unwrap_err();
        assert!(matches!(err, SealError::TooShort(11)));
    }

    #[test]
    fn open_with_wrong_key_is_authentication_failure() {
        let sealed = seal(generate_key().as_ref(), b"x").unwrap();
        let err = open(generate_key().as_ref(), &sealed).unwrap_err();
        assert!(matches!(err, SealError::AuthenticationFailure));
    }

    #[test]
    fn seal_rejects_bad_key_length() {
        assert!(matches!(
            seal(&[0u8; 16], b"x"),
            Err(SealError::EncryptionFailed(_))
        ));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(*generate_key(), *generate_key());
    }
}
