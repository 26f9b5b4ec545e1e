//! `sealstore put` — store a new version of a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::{Result, SealError};

/// Execute the `put` command.
pub fn execute(cli: &Cli, path: &str, value: Option<&str>, version_id: Option<&str>) -> Result<()> {
    // Determine the secret value from one of three sources.
    let secret_value: Zeroizing<Vec<u8>> = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line; it may appear in shell history.");
        Zeroizing::new(v.as_bytes().to_vec())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal), stored byte for byte.
        let mut buf = Zeroizing::new(Vec::new());
        io::stdin().read_to_end(&mut buf)?;
        strip_line_ending(&mut buf);
        buf
    } else {
        // Source 3: Interactive secure prompt (default).
        let typed = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter value for {path}"))
                .interact()
                .map_err(|e| SealError::CommandFailed(format!("input prompt: {e}")))?,
        );
        Zeroizing::new(typed.as_bytes().to_vec())
    };

    let service = open_service(cli)?;
    let version = match version_id {
        Some(id) => service.put_with_version(path, &secret_value, id)?,
        None => service.put(path, &secret_value)?,
    };

    output::success(&format!("Stored '{path}' as version {version}"));
    println!("{version}");

    Ok(())
}

/// Drop the single line ending `echo` and most editors append.
///
/// Any other trailing whitespace is part of the value.
fn strip_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}
