//! RPC client error types.

use thiserror::Error;

/// Errors that can occur issuing a chain API call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport-level failure: connection refused, DNS, timeout. The only
    /// error class the retry loop acts on.
    #[error("Connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// The endpoint answered with a non-success HTTP status. Terminal unless
    /// the status is explicitly configured as retryable.
    #[error("HTTP {status} from {url}{path}: {body}")]
    Status {
        url: String,
        path: String,
        status: u16,
        body: String,
    },

    /// A 200 response whose body did not parse into the expected shape.
    /// Never retried and never failed over.
    #[error("Failed to decode {path} response: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint reports a different chain than the one this client
    /// already trusts. The endpoint is skipped, not retried.
    #[error("Endpoint {url} reports chain id {got}, expected {expected}")]
    ChainIdMismatch {
        url: String,
        expected: String,
        got: String,
    },

    #[error("No endpoints configured")]
    NoEndpoints,

    /// Every configured endpoint was tried and failed; carries the last
    /// error plus the total attempt and failover counts for diagnostics.
    #[error("All endpoints exhausted after {attempts} attempts and {failovers} failovers: {last}")]
    Exhausted {
        attempts: u64,
        failovers: u64,
        #[source]
        last: Box<RpcError>,
    },
}

impl RpcError {
    /// True for transport-level failures that the same-endpoint retry loop
    /// may act on.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
