//! Multi-key KEK provider.
//!
//! Wraps with one active provider and unwraps with whichever provider
//! owns the requested key identifier.  After a KEK rotation the old
//! provider is kept here as retired, so data keys it wrapped stay
//! readable until they are re-wrapped.

use std::collections::HashMap;

use zeroize::Zeroizing;

use super::{KekProvider, WrappedKey};
use crate::errors::{Result, SealError};

/// A set of KEKs with one designated for new wraps.
pub struct KekRing {
    active: Box<dyn KekProvider>,
    retired: HashMap<String, Box<dyn KekProvider>>,
}

impl KekRing {
    /// Start a ring with `active` as the only key.
    pub fn new(active: Box<dyn KekProvider>) -> Self {
        Self {
            active,
            retired: HashMap::new(),
        }
    }

    /// Keep `provider` around for unwrapping only.
    pub fn with_retired(mut self, provider: Box<dyn KekProvider>) -> Self {
        let kid = provider.kid().to_string();
        if kid != self.active.kid() {
            self.retired.insert(kid, provider);
        }
        self
    }

    /// Identifiers of every key this ring can unwrap with, active first.
    pub fn kids(&self) -> Vec<&str> {
        let mut retired: Vec<&str> = self.retired.keys().map(String::as_str).collect();
        retired.sort_unstable();
        std::iter::once(self.active.kid()).chain(retired).collect()
    }
}

impl KekProvider for KekRing {
    fn kid(&self) -> &str {
        self.active.kid()
    }

    fn wrap(&self, dek: &[u8]) -> Result<WrappedKey> {
        self.active.wrap(dek)
    }

    fn unwrap(&self, wrapped: &[u8], kid: &str) -> Result<Zeroizing<Vec<u8>>> {
        if kid.is_empty() || kid == self.active.kid() {
            return self.active.unwrap(wrapped, kid);
        }
        match self.retired.get(kid) {
            Some(provider) => provider.unwrap(wrapped, kid),
            None => Err(SealError::KeyMismatch {
                have: self.kids().join(", "),
                want: kid.to_string(),
            }),
        }
    }
}
