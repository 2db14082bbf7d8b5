use tracing_subscriber::{fmt, EnvFilter};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let cfg = atelier::config::Config::from_env();
    // Startup banner at info level so something always prints at default verbosity
    info!(
        target: "atelier",
        "Atelier console starting: backend_configured={}, data_dir='{}'",
        cfg.backend_url.is_some() && cfg.backend_key.is_some(),
        cfg.data_dir.display()
    );

    atelier::cli::run(cfg)
}
