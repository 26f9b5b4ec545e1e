//! Configuration loaded from `.sealstore.toml`.

pub mod settings;

pub use settings::Settings;
