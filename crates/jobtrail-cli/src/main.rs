//! `jobtrail` binary entry point.

use anyhow::Result;
use clap::Parser;
use jobtrail_cli::{config_path, load_config, run, Cli};
use tracing::info;

/// Initialize tracing subscriber for logging
fn init_tracing(default_filter: &str, verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.general.log_level, cli.verbose);

    info!("Starting jobtrail v{}", env!("CARGO_PKG_VERSION"));

    let path = config_path(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    run(cli.command, config, &path, &mut stdout).await
}
