use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks `debug` over `info`
/// for this crate and `warn` for everything else. Output goes to stderr so
/// JSON on stdout stays parseable.
pub fn init(verbose: bool) {
    let default = if verbose {
        "pubtrack=debug,tower_http=debug,warn"
    } else {
        "pubtrack=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
