//! Startup orchestration.
//!
//! # Responsibilities
//! - Build checkables from configuration
//! - Create the shared aggregator and start the health monitor
//! - Create the health responder reading from the same aggregator
//! - Run until a shutdown signal, then drain
//!
//! # Design Decisions
//! - Fail fast: any assembly error is fatal
//! - The aggregator is owned here and injected; nothing is global

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::checks::{build_all, BuildError};
use crate::config::AppConfig;
use crate::health::{self, MonitorHandle, ProbeError, StatusAggregator};
use crate::http::HealthServer;
use crate::lifecycle::shutdown::{drain_and_stop, Shutdown};

/// Error assembling or running the application.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build dependency checks: {0}")]
    Checks(#[from] BuildError),

    #[error("failed to start health monitor: {0}")]
    Monitor(#[from] ProbeError),

    #[error("health responder failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("health responder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A fully assembled application.
pub struct App {
    pub aggregator: Arc<StatusAggregator>,
    pub monitor: MonitorHandle,
    pub server: HealthServer,
    drain: Duration,
}

/// Build checks, start probing and prepare the responder.
///
/// Must be called from within a Tokio runtime: the monitor is spawned here.
pub fn assemble(config: &AppConfig) -> Result<App, StartupError> {
    let checkables = build_all(&config.dependencies)?;
    tracing::info!(
        dependencies = checkables.len(),
        interval_secs = config.probe.interval_secs,
        "Registering dependency checks"
    );

    let aggregator = Arc::new(StatusAggregator::new());
    let monitor = health::start(config.probe.interval(), aggregator.clone(), checkables)?;
    let server = HealthServer::new(config, aggregator.clone());

    Ok(App {
        aggregator,
        monitor,
        server,
        drain: config.probe.shutdown_drain(),
    })
}

impl App {
    /// Serve on `listener` until `signal` resolves, then drain and stop.
    pub async fn serve_until<F>(self, listener: TcpListener, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        let App {
            aggregator,
            mut monitor,
            server,
            drain,
        } = self;

        let shutdown = Shutdown::new();
        let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

        signal.await;
        drain_and_stop(&mut monitor, &aggregator, drain, &shutdown).await;

        server.await??;
        Ok(())
    }
}
