//! One module per subcommand.

pub mod delete;
pub mod get;
pub mod inspect;
pub mod kek;
pub mod paths;
pub mod put;
pub mod versions;
