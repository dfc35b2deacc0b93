//! TCP connect check.

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;

use crate::health::checkable::{Check, CheckContext, CheckError};

/// Healthy when a TCP connection to `address` opens before the deadline.
#[derive(Debug, Clone)]
pub struct TcpCheck {
    address: String,
}

impl TcpCheck {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl Check for TcpCheck {
    fn check(&self, ctx: CheckContext) -> BoxFuture<'_, Result<(), CheckError>> {
        Box::pin(async move {
            let connect = TcpStream::connect(self.address.as_str());
            let _stream = tokio::time::timeout_at(ctx.deadline(), connect)
                .await
                .map_err(|_| CheckError::new(format!("connect to {} timed out", self.address)))?
                .map_err(|e| CheckError::new(format!("connect to {}: {}", self.address, e)))?;
            Ok(())
        })
    }
}
