//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::crypto::FileKek;
use crate::errors::{Result, SealError};
use crate::service::SecretService;
use crate::store::SqliteStore;

/// Exit code for generic failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for a missing or unreadable secret.
pub const EXIT_UNAVAILABLE: i32 = 2;
/// Exit code for backend outages; the only case worth retrying.
pub const EXIT_RETRYABLE: i32 = 3;

/// Message shown for not-found and decryption failures unless detail is
/// explicitly enabled.
const OPAQUE_MESSAGE: &str = "Secret unavailable (not found or could not be decrypted)";

/// sealstore CLI: versioned secret store with envelope encryption.
#[derive(Parser)]
#[command(
    name = "sealstore",
    about = "Versioned secret store with envelope encryption",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key-encrypting-key file (default from .sealstore.toml)
    #[arg(long, env = "SEALSTORE_KEK_FILE", global = true)]
    pub kek_file: Option<String>,

    /// SQLite database file (default from .sealstore.toml)
    #[arg(long, env = "SEALSTORE_DB", global = true)]
    pub db: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a new version of a secret
    Put {
        /// Secret path (e.g. db/password)
        path: String,
        /// Secret value (omit for piped input or interactive prompt)
        value: Option<String>,
        /// Explicit version identifier (generated when omitted)
        #[arg(long = "version-id")]
        version_id: Option<String>,
    },

    /// Print a secret's value
    Get {
        /// Secret path
        path: String,
        /// Version identifier (default: latest)
        #[arg(long = "version-id", default_value = "latest")]
        version_id: String,
        /// Print JSON with version metadata
        #[arg(long)]
        json: bool,
    },

    /// List the versions of a secret
    Versions {
        /// Secret path
        path: String,
    },

    /// List all secret paths
    Paths,

    /// Show a stored version without decrypting it
    Inspect {
        /// Secret path
        path: String,
        /// Version identifier (default: latest)
        #[arg(long = "version-id", default_value = "latest")]
        version_id: String,
    },

    /// Delete a secret and all of its versions
    Delete {
        /// Secret path
        path: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Manage the key-encrypting key
    Kek {
        #[command(subcommand)]
        action: KekAction,
    },
}

/// KEK subcommands.
#[derive(clap::Subcommand)]
pub enum KekAction {
    /// Generate a new key file (fails if one exists)
    Init,

    /// Show the key identifier and fingerprint
    Info,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Settings from `.sealstore.toml` in the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// KEK file path: `--kek-file` / `SEALSTORE_KEK_FILE`, then config.
pub fn kek_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.kek_file {
        Some(path) => cwd.join(path),
        None => settings.kek_path(&cwd),
    })
}

/// Database path: `--db` / `SEALSTORE_DB`, then config.
pub fn db_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.db {
        Some(path) => cwd.join(path),
        None => settings.database_path(&cwd),
    })
}

/// Build the service from CLI arguments and config.
///
/// The KEK file is created on first use.
pub fn open_service(cli: &Cli) -> Result<SecretService<FileKek, SqliteStore>> {
    let settings = load_settings()?;
    let kek = FileKek::open(&kek_path(cli, &settings)?)?;
    let store = SqliteStore::open(&db_path(cli, &settings)?, settings.store_timeout())?;
    Ok(SecretService::new(kek, store))
}

/// Map an error to the message shown to the user and a process exit code.
pub fn describe_error(err: &SealError, reveal_detail: bool) -> (String, i32) {
    if err.is_opaque() {
        let msg = if reveal_detail {
            err.to_string()
        } else {
            OPAQUE_MESSAGE.to_string()
        };
        return (msg, EXIT_UNAVAILABLE);
    }
    if err.is_retryable() {
        return (err.to_string(), EXIT_RETRYABLE);
    }
    (err.to_string(), EXIT_FAILURE)
}
