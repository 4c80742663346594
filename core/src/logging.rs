//! Global `tracing` subscriber setup.
//!
//! Test harnesses log through libtest's captured writer; binaries log to
//! stderr so their stdout stays free for the output they relay.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;

/// Install the subscriber for test code. `RUST_LOG` overrides `LOG_LEVEL`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init(config: &Config) {
    init_with_default(config.tracing_directive());
}

pub fn init_with_default(directive: &str) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(directive))
        .with_test_writer()
        .finish();

    // Already installed by an earlier call or another test.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Install the subscriber for a binary, writing to stderr.
pub fn init_stderr(config: &Config) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(config.tracing_directive()))
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn env_filter(directive: &str) -> EnvFilter {
    std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(directive),
        |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(directive)),
    )
}
