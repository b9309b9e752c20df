//! Logging initialization

/// Initialize logging based on the debug flag
///
/// Logs go to stderr so `show` and `export` output on stdout stays clean.
/// `RUST_LOG` overrides the level; otherwise warnings only, or everything
/// from `debug` up with `--debug`.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .init();
}
