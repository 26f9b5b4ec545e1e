pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod service;
pub mod store;

pub use crypto::{CiphertextBundle, Envelope, FileKek, KekProvider, KekRing, WrappedKey};
pub use errors::{Result, SealError};
pub use service::{Clock, RevealedSecret, SecretService, SystemClock};
pub use store::{MemoryStore, SecretStore, SqliteStore};
