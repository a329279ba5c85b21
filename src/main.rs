use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use asset_preprocessor::config::{load_config, AppConfig, ConfigWatcher};
use asset_preprocessor::lifecycle::{initialize, shutdown_signal, Shutdown};
use asset_preprocessor::observability::{logging, metrics};

/// Serve a theme directory, compiling stylesheets and scripts on request.
#[derive(Debug, Parser)]
#[command(name = "asset-preprocessor", version, about)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "ASSET_PREPROCESSOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "asset-preprocessor starting"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = initialize(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => result??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
