//! HTTP GET check.

use axum::body::{to_bytes, Body};
use futures_util::future::BoxFuture;
use hyper::{header::USER_AGENT, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::health::checkable::{Check, CheckContext, CheckError};

/// Response bodies are drained up to this size; larger ones are discarded.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Healthy when `GET uri` answers with the expected status (any 2xx by default).
pub struct HttpCheck {
    uri: Uri,
    expect_status: Option<StatusCode>,
    client: Client<HttpConnector, Body>,
}

impl HttpCheck {
    pub fn new(uri: Uri, expect_status: Option<StatusCode>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            uri,
            expect_status,
            client,
        }
    }

    fn is_expected(&self, status: StatusCode) -> bool {
        match self.expect_status {
            Some(expected) => status == expected,
            None => status.is_success(),
        }
    }
}

impl Check for HttpCheck {
    fn check(&self, ctx: CheckContext) -> BoxFuture<'_, Result<(), CheckError>> {
        Box::pin(async move {
            let request = Request::builder()
                .method("GET")
                .uri(self.uri.clone())
                .header(USER_AGENT, "depwatch-health-check")
                .body(Body::empty())
                .map_err(|e| CheckError::new(format!("failed to build request: {}", e)))?;

            let exchange = async {
                let response = self.client.request(request).await?;
                let status = response.status();
                // Read to the end so the connection goes back to the pool.
                let _ = to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES).await;
                Ok::<_, hyper_util::client::legacy::Error>(status)
            };

            let status = tokio::time::timeout_at(ctx.deadline(), exchange)
                .await
                .map_err(|_| CheckError::new(format!("GET {} timed out", self.uri)))?
                .map_err(|e| CheckError::new(format!("GET {}: {}", self.uri, e)))?;

            if self.is_expected(status) {
                Ok(())
            } else {
                Err(CheckError::new(format!("GET {} returned {}", self.uri, status)))
            }
        })
    }
}
