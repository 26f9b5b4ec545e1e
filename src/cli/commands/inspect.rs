//! `sealstore inspect` — dump a stored version without decrypting it.
//!
//! Useful when checking which KEK protects a version, e.g. before
//! retiring a key.

use crate::cli::{open_service, Cli};
use crate::errors::{Result, SealError};
use crate::store::SecretStore;

/// Execute the `inspect` command.
pub fn execute(cli: &Cli, path: &str, version_id: &str) -> Result<()> {
    let service = open_service(cli)?;
    let stored = service.store().get(path, version_id)?;

    let text = serde_json::to_string_pretty(&stored)
        .map_err(|e| SealError::Serialization(format!("JSON output: {e}")))?;
    println!("{text}");

    Ok(())
}
