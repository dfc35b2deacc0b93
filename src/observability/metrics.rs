//! Metrics collection and exposition.
//!
//! # Metrics
//! - `depwatch_checks_total` (counter): checks by service and result
//! - `depwatch_check_duration_seconds` (histogram): per-check latency
//! - `depwatch_round_duration_seconds` (histogram): whole-round latency
//! - `depwatch_round_dependencies` (gauge): checkables probed in the last round
//! - `depwatch_status` (gauge): 1=ok, 0=not-ok, per status key

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::status::StatusKey;

/// Install the Prometheus exporter and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("depwatch_checks_total", "Dependency checks by service and result");
    describe_histogram!(
        "depwatch_check_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent in a single dependency check"
    );
    describe_histogram!(
        "depwatch_round_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent in a whole probe round"
    );
    describe_gauge!("depwatch_round_dependencies", "Dependencies probed in the last round");
    describe_gauge!("depwatch_status", "Status key health (1=ok, 0=not-ok)");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_check(service_id: &str, result: &'static str, elapsed: Duration) {
    counter!("depwatch_checks_total", "service" => service_id.to_string(), "result" => result)
        .increment(1);
    histogram!("depwatch_check_duration_seconds", "service" => service_id.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_round(elapsed: Duration, dependencies: usize) {
    histogram!("depwatch_round_duration_seconds").record(elapsed.as_secs_f64());
    gauge!("depwatch_round_dependencies").set(dependencies as f64);
}

pub fn record_status(key: StatusKey, ok: bool) {
    gauge!("depwatch_status", "status" => key.as_str()).set(if ok { 1.0 } else { 0.0 });
}
