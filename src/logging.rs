use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset. yt-dlp's stderr is logged at info under
/// the `yt-dlp` target, so it shows up here.
pub const DEFAULT_FILTER: &str = "info";

// diagnostics, including yt-dlp's stderr, go to our own stderr
pub fn init_logging() {
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .init();
}
