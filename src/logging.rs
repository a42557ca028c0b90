use tracing_subscriber::EnvFilter;

/// Logs go to stderr. `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
    let default = if verbose { "git_metrics=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
