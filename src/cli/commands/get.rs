//! `sealstore get` — retrieve and print a secret's value.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use crate::cli::{open_service, Cli};
use crate::errors::{Result, SealError};

/// Execute the `get` command.
pub fn execute(cli: &Cli, path: &str, version_id: &str, as_json: bool) -> Result<()> {
    let service = open_service(cli)?;
    let secret = service.get(path, version_id)?;

    if as_json {
        let mut doc = serde_json::Map::new();
        doc.insert("path".into(), json!(path));
        doc.insert("version".into(), json!(secret.version_id));
        doc.insert("created_at".into(), json!(secret.created_at.to_rfc3339()));
        match secret.as_str() {
            Some(s) => doc.insert("value".into(), json!(s)),
            None => doc.insert(
                "value_base64".into(),
                json!(BASE64.encode(secret.value.as_slice())),
            ),
        };

        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| SealError::Serialization(format!("JSON output: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    // Values are printed exactly; non-UTF-8 bytes go out untouched.
    let mut stdout = io::stdout().lock();
    stdout.write_all(&secret.value)?;
    if secret.as_str().is_some() {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    Ok(())
}
