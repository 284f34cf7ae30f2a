//! Logging setup for the provider binary.
//!
//! All output goes to **stderr**: stdout carries the handshake line the host
//! reads to find the gRPC address.
//!
//! Filtering follows `RUST_LOG`, e.g.
//!
//! ```bash
//! RUST_LOG=hemmer_provider_hetznerrobot=debug ./hemmer-provider-hetznerrobot
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, returning false if one was already set.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

/// Install the global subscriber at the default level.
///
/// A second call is a no-op.
pub fn init_logging() {
    if !try_init_logging(DEFAULT_LOG_LEVEL) {
        tracing::debug!("tracing subscriber already installed");
    }
}
