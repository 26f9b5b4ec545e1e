//! `sealstore paths` — list every secret path.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::Result;

/// Execute the `paths` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;
    let paths = service.paths()?;

    if paths.is_empty() {
        output::info("No secrets stored yet.");
        return Ok(());
    }

    for path in &paths {
        println!("{path}");
    }
    Ok(())
}
