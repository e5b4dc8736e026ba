use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects debug output and the
/// default is warnings only, which keeps the game's own output readable.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    // `try_init` only fails if a subscriber was already set. Ignore that case
    // so tests can call `init` multiple times without panicking.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
