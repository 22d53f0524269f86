use tracing_subscriber::EnvFilter;

/// Sets up the `tracing` subscriber.
///
/// Reads `RUST_LOG` for directives and defaults to `warn`. Logs go to stderr so
/// that tables printed on stdout stay machine-readable.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
