//! Tracing setup for the binary.
//!
//! Library code only emits `tracing` events; the subscriber is installed
//! once, here, and writes to stderr so stdout stays clean for values.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between warnings
/// only and debug output for this crate.
pub fn init(verbose: bool) {
    let fallback = if verbose { "sealstore=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .ok();
}
