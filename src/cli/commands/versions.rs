//! `sealstore versions` — list every version of a secret.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::Result;

/// Execute the `versions` command.
pub fn execute(cli: &Cli, path: &str) -> Result<()> {
    let service = open_service(cli)?;
    let versions = service.versions(path)?;

    output::info(&format!("{} version(s)", versions.len()));
    output::print_versions_table(path, &versions);

    Ok(())
}
