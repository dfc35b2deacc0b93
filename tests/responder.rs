//! Health responder tests against a running server.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use depwatch::config::{AppConfig, CheckConfig, DependencyConfig};
use depwatch::health::StatusKey;
use depwatch::lifecycle::assemble;
use serde_json::Value;
use tokio::sync::oneshot;

mod common;

fn config_with(bind: SocketAddr, dependencies: Vec<DependencyConfig>) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = bind.to_string();
    config.service.environment = "test".into();
    config.probe.interval_secs = 1;
    config.probe.shutdown_drain_secs = Some(1);
    config.dependencies = dependencies;
    config
}

fn tcp_dependency(id: &str, address: SocketAddr, affects: Vec<StatusKey>) -> DependencyConfig {
    DependencyConfig {
        id: id.into(),
        affects,
        check: CheckConfig::Tcp { address: address.to_string() },
    }
}

#[tokio::test]
async fn test_health_document_and_probes() {
    let db_addr: SocketAddr = "127.0.0.1:28381".parse().unwrap();
    let cache_addr: SocketAddr = "127.0.0.1:28382".parse().unwrap(); // nothing listens here
    let responder_addr: SocketAddr = "127.0.0.1:28383".parse().unwrap();

    common::start_tcp_dependency(db_addr).await;

    let config = config_with(
        responder_addr,
        vec![
            tcp_dependency("postgres", db_addr, vec![StatusKey::Ready, StatusKey::Live]),
            tcp_dependency("redis", cache_addr, vec![StatusKey::Startup]),
        ],
    );

    let app = assemble(&config).unwrap();
    let listener = tokio::net::TcpListener::bind(responder_addr).await.unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.serve_until(listener, async {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    let base = format!("http://{}", responder_addr);

    let res = client.get(format!("{}/-/health", base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let doc: Value = res.json().await.unwrap();
    assert_eq!(doc["env"], "test");
    assert_eq!(doc["ready"], "ok");
    assert_eq!(doc["live"], "ok");
    assert_eq!(doc["startup"], "not-ok");
    assert!(doc["postgres"].as_str().unwrap().starts_with("ok: "));
    assert!(doc["redis"].as_str().unwrap().starts_with("not-ok: "));

    let ready = client.get(format!("{}/-/ready", base)).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(ready.text().await.unwrap(), "ok");

    let startup = client.get(format!("{}/-/startup", base)).send().await.unwrap();
    assert_eq!(startup.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(startup.text().await.unwrap(), "not-ok");

    let unknown = client.get(format!("{}/-/healthz", base)).send().await.unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let _ = stop_tx.send(());
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_drops_readiness_while_draining() {
    let db_addr: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    let responder_addr: SocketAddr = "127.0.0.1:28483".parse().unwrap();

    common::start_tcp_dependency(db_addr).await;

    let config = config_with(
        responder_addr,
        vec![tcp_dependency("postgres", db_addr, vec![StatusKey::Ready, StatusKey::Live])],
    );

    let app = assemble(&config).unwrap();
    let listener = tokio::net::TcpListener::bind(responder_addr).await.unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.serve_until(listener, async {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    let base = format!("http://{}", responder_addr);

    let ready = client.get(format!("{}/-/ready", base)).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let _ = stop_tx.send(());
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Draining: still serving, but no longer ready.
    let ready = client.get(format!("{}/-/ready", base)).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    let live = client.get(format!("{}/-/live", base)).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    server.await.unwrap().unwrap();
    assert!(client.get(format!("{}/-/ready", base)).send().await.is_err());
}
