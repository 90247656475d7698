//! Troxy replay server.
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http server ─▶ dispatch ─▶ routing ─▶ recording    │
//!                         │                     │                     store      │
//!                         │                     ▼                                │
//!     Client Response     │                 statistics ◀──── admin API ◀─────────┼── troxy-cli
//!     ◀───────────────────┼── canned / unmatched response                        │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use clap::Parser;

use troxy::config::{load_config, TroxyConfig};
use troxy::lifecycle::{signals::shutdown_signal, start};
use troxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "troxy", version, about = "Replay recorded HTTP responses", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Recording files, appended after those in the config file.
    recordings: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TroxyConfig::default(),
    };
    if let Some(port) = args.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    config.recordings.sources.extend(args.recordings);

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "troxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        recordings = config.recordings.sources.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = start(config).await?;
    tracing::info!(url = %server.base_url(), "Ready");

    shutdown_signal().await;
    server.stop().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
