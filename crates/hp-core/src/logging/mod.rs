//! Logging setup for the hostprobe binary.
//!
//! stdout carries command output only. All diagnostics go to stderr, either
//! as human-readable lines or as JSON objects, one per line.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crate targets that receive the configured level.
const TARGETS: [&str; 3] = ["hp_core", "hp_common", "hostprobe"];

/// Filter directive for `config`, e.g. `hp_core=debug,hp_common=debug,...`.
pub fn filter_directive(config: &LogConfig) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={}", config.level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// A full `RUST_LOG` directive (one with `=`) wins over `config.level`.
/// Calling this twice is harmless; the second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| v.contains('='))
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directive(config)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}
