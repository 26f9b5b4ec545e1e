//! `sealstore delete` — remove a secret and all of its versions.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::{Result, SealError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, path: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{path}' and every version of it?"))
            .default(false)
            .interact()
            .map_err(|e| SealError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let service = open_service(cli)?;
    let removed = service.delete(path)?;

    output::success(&format!("Deleted '{path}' ({removed} version(s))"));

    Ok(())
}
