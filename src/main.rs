//! depwatch health responder
//!
//! Probes the configured dependencies on a fixed interval and serves the
//! aggregated result to process orchestrators.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────┐     ┌───────────────┐     ┌────────────────────┐
//!     │ health       │────▶│ probe round   │────▶│ per-dependency     │
//!     │ monitor      │     │ executor      │◀────│ checks (tcp/http)  │
//!     └──────┬───────┘     └───────────────┘     └────────────────────┘
//!            │ apply_round
//!            ▼
//!     ┌──────────────┐     ┌───────────────┐
//!     │ status       │◀────│ health        │◀──── GET /-/health, /-/ready, ...
//!     │ aggregator   │     │ responder     │
//!     └──────────────┘     └───────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use depwatch::config::{load_config, AppConfig};
use depwatch::lifecycle::{assemble, wait_for_signal};
use depwatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "depwatch")]
#[command(about = "Dependency health prober and responder", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
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
        name = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        "depwatch starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let app = assemble(&config)?;
    let listener = TcpListener::bind(config.listener.bind_address.as_str()).await?;

    app.serve_until(listener, async {
        match wait_for_signal().await {
            Ok(signal) => tracing::info!(signal, "Shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signals"),
        }
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
