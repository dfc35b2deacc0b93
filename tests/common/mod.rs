//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depwatch::health::{check_fn, CheckError, Checkable, StatusKey};
use tokio::net::TcpListener;

/// A checkable that always succeeds.
#[allow(dead_code)]
pub fn healthy(id: &str, affects: &[StatusKey]) -> Checkable {
    let check = check_fn(|_ctx| async { Ok::<(), CheckError>(()) });
    Checkable::new(id, affects.iter().copied(), check).unwrap()
}

/// A checkable that always fails with `reason`.
#[allow(dead_code)]
pub fn failing(id: &str, affects: &[StatusKey], reason: &'static str) -> Checkable {
    let check = check_fn(move |_ctx| async move { Err::<(), _>(CheckError::new(reason)) });
    Checkable::new(id, affects.iter().copied(), check).unwrap()
}

/// A checkable whose check sleeps for `delay` before succeeding.
#[allow(dead_code)]
pub fn sleeping(id: &str, affects: &[StatusKey], delay: Duration) -> Checkable {
    let check = check_fn(move |_ctx| async move {
        tokio::time::sleep(delay).await;
        Ok::<(), CheckError>(())
    });
    Checkable::new(id, affects.iter().copied(), check).unwrap()
}

/// A checkable whose result follows a shared switch.
#[allow(dead_code)]
pub fn switchable(id: &str, affects: &[StatusKey], up: Arc<AtomicBool>) -> Checkable {
    let check = check_fn(move |_ctx| {
        let ok = up.load(Ordering::SeqCst);
        async move {
            if ok {
                Ok(())
            } else {
                Err(CheckError::new("switched off"))
            }
        }
    });
    Checkable::new(id, affects.iter().copied(), check).unwrap()
}

/// Start a TCP listener that accepts and immediately drops connections.
#[allow(dead_code)]
pub async fn start_tcp_dependency(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });
}
