//! The `HttpTransport` trait — the seam between the failover client and the
//! actual HTTP stack, so retry and failover behavior is testable against a
//! scripted transport.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::RpcError;

/// A raw HTTP response: the status line plus the body bytes. The client
/// decides what a given status means; the transport only reports it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Posts JSON bodies to chain API paths.
///
/// Implementations return `Err` only for transport-level failures
/// (connection refused, DNS, timeout). Any response with a status line,
/// success or not, is returned as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn post(
        &self,
        url: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse, RpcError>;
}

/// The production transport, backed by `reqwest`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RpcError::Connection {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse, RpcError> {
        let full = format!("{url}{path}");
        let mut request = self.http.post(&full);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| RpcError::Connection {
            url: url.into(),
            reason: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| RpcError::Connection {
                url: url.into(),
                reason: e.to_string(),
            })?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}
