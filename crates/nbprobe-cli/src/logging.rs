//! Logging setup for the CLI.
//!
//! Library code logs through `tracing`; this installs the subscriber. The
//! filter comes from `RUST_LOG` when set, otherwise from the verbosity flags.

use crate::config::Verbosity;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter from an optional `RUST_LOG` value, falling back to `verbosity`
#[must_use]
pub fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.filter_directive()))
}

/// Install the global subscriber, writing to stderr.
///
/// Calling it twice is harmless; the second call does nothing.
pub fn init_logging(verbosity: Verbosity, color: bool, json: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(verbosity, rust_log.as_deref());
    let registry = tracing_subscriber::registry().with(filter);

    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(color)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
