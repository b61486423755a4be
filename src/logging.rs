//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Honors `RUST_LOG` and defaults to `info`.
///
/// Logs are written to stderr so stdout only carries the result.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) is not an error worth failing on.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
