//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::store::VersionMetadata;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a table of version metadata (Version, Created, Key ID).
pub fn print_versions_table(path: &str, versions: &[VersionMetadata]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Version", "Created", "Key ID"]);

    for (i, v) in versions.iter().enumerate() {
        let version = if i == 0 {
            format!("{} (latest)", v.version_id)
        } else {
            v.version_id.clone()
        };
        table.add_row(vec![
            version,
            v.created_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            v.kid.clone(),
        ]);
    }

    println!("{}", style(path).bold());
    println!("{table}");
}
