//! `sealstore kek` — create and inspect the key-encrypting key.

use crate::cli::output;
use crate::cli::{kek_path, load_settings, Cli};
use crate::crypto::{FileKek, KekProvider};
use crate::errors::Result;

/// Execute `kek init`: generate a new key file.
pub fn execute_init(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let kek = FileKek::generate(&kek_path(cli, &settings)?)?;

    output::success(&format!("Generated key-encrypting key at {}", kek.path().display()));
    output::warning("Back this file up: secrets cannot be decrypted without it.");
    println!("{}", kek.kid());

    Ok(())
}

/// Execute `kek info`: show the identifier and fingerprint.
pub fn execute_info(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let kek = FileKek::load(&kek_path(cli, &settings)?)?;

    println!("kid:         {}", kek.kid());
    println!("fingerprint: {}", kek.fingerprint());

    Ok(())
}
