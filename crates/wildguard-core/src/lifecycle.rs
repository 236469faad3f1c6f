use tracing_subscriber::EnvFilter;

/// Initialize tracing with env filter support.
///
/// Set `RUST_LOG=debug` for verbose output, defaults to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
        )
        .init();
}

pub fn log_startup(api_base_url: &str) {
    tracing::info!("WildGuard console starting up (api: {api_base_url})");
}

pub fn log_shutdown() {
    tracing::info!("WildGuard console shutting down");
}
