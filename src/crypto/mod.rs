//! Cryptographic primitives for sealstore.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening (`encryption`)
//! - Key-encrypting-key providers (`kek`)
//! - Envelope encryption of secret values (`envelope`)

pub mod encryption;
pub mod envelope;
pub mod kek;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{Envelope, FileKek, KekProvider, ...};
pub use envelope::{CiphertextBundle, Envelope};
pub use kek::{FileKek, KekProvider, KekRing, WrappedKey};
