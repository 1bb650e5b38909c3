// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, logging to stderr
///
/// `RUST_LOG` takes precedence over `level`. Calling this again after a
/// subscriber is installed is a no-op and returns `false`.
pub fn init(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
