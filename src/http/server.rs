//! Health responder HTTP server.
//!
//! # Responsibilities
//! - Render the aggregate snapshot plus process metadata as JSON
//! - Answer orchestrator probes per status key with 200 / 503
//! - Wire up middleware (request ID, timeout, tracing)
//! - Stop serving when the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, ServiceConfig};
use crate::health::{HealthSnapshot, StatusAggregator, StatusKey};

/// Path of the JSON health document.
pub const HEALTH_PATH: &str = "/-/health";

/// Static process metadata merged into the health document.
#[derive(Debug, Clone)]
pub struct ServiceMetadata {
    pub name: String,
    pub environment: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl ServiceMetadata {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            name: config.name.clone(),
            environment: config.environment.clone(),
            version: config.version.clone(),
            started_at: Utc::now(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<StatusAggregator>,
    pub metadata: Arc<ServiceMetadata>,
}

/// HTTP server exposing the aggregated dependency health.
pub struct HealthServer {
    router: Router,
}

impl HealthServer {
    /// Create a new health server reading from `aggregator`.
    pub fn new(config: &AppConfig, aggregator: Arc<StatusAggregator>) -> Self {
        let state = AppState {
            aggregator,
            metadata: Arc::new(ServiceMetadata::from_config(&config.service)),
        };
        let timeout = Duration::from_secs(config.listener.request_timeout_secs);

        Self {
            router: Self::build_router(state, timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, timeout: Duration) -> Router {
        let router = Router::new()
            .route(HEALTH_PATH, get(health_handler))
            .route("/-/{status}", get(probe_handler))
            .with_state(state);

        with_middleware(router, timeout)
    }

    /// The router, for embedding into a larger application.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Health responder listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Health responder stopped");
        Ok(())
    }
}

/// Wrap `router` in the request id, tracing and timeout layers.
fn with_middleware(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
    )
}

/// Render the health document: metadata first, then the snapshot on top.
pub fn render_health(metadata: &ServiceMetadata, snapshot: HealthSnapshot) -> Value {
    let status = if snapshot.all_ok() {
        "all systems up and running"
    } else {
        "degraded"
    };

    let mut payload = Map::new();
    payload.insert("name".into(), Value::from(metadata.name.clone()));
    payload.insert("env".into(), Value::from(metadata.environment.clone()));
    payload.insert("version".into(), Value::from(metadata.version.clone()));
    payload.insert("status".into(), Value::from(status));
    payload.insert(
        "startedAt".into(),
        Value::from(metadata.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    let flat: std::collections::BTreeMap<String, String> = snapshot.into();
    for (key, value) in flat {
        payload.insert(key, Value::from(value));
    }

    Value::Object(payload)
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(render_health(&state.metadata, state.aggregator.snapshot()))
}

async fn probe_handler(State(state): State<AppState>, Path(status): Path<String>) -> Response {
    let key: StatusKey = match status.parse() {
        Ok(key) => key,
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    let health = state.aggregator.snapshot().status(key);
    let code = if health.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, health.as_str()).into_response()
}
