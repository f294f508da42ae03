//! The failover RPC client.
//!
//! State machine per logical call: verify the current endpoint's chain
//! identity (once per endpoint), execute the call with bounded same-endpoint
//! retries on connection failures, fail over to the next endpoint when an
//! endpoint is exhausted or untrustworthy. HTTP status errors and decode
//! failures are terminal. Attempts and failovers for a single logical call
//! are strictly sequential, but distinct calls on one client proceed
//! independently; shared state is only touched under a short-lived lock.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::RpcError;
use crate::models::{
    Block, ChainInfo, PackedTransaction, RawAbi, RequiredKeys, TableRows, TableRowsRequest,
    TransactionResponse,
};
use crate::transport::{HttpTransport, ReqwestTransport};

const GET_INFO: &str = "/v1/chain/get_info";

/// Retry behavior for one endpoint.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per endpoint before failing over (connection failures only).
    pub attempts: u32,
    /// Pause between attempts on the same endpoint.
    pub delay: Duration,
    /// HTTP statuses to treat as transient. Empty by default: status errors
    /// are semantically final.
    pub retryable_statuses: HashSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(100),
            retryable_statuses: HashSet::new(),
        }
    }
}

/// Cumulative counters, readable after any call for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcStats {
    /// HTTP attempts issued, including `get_info` verification calls.
    pub attempts: u64,
    /// Advances to the next endpoint.
    pub failovers: u64,
}

#[derive(Debug)]
struct State {
    /// Learned from the first successful `get_info`; never overwritten.
    chain_id: Option<String>,
    /// Index of the endpoint serving calls.
    current: usize,
    /// Endpoints whose chain identity has been confirmed.
    verified: Vec<bool>,
    stats: RpcStats,
}

/// Multi-endpoint chain API client.
pub struct RpcClient {
    endpoints: Vec<String>,
    retry: RetryConfig,
    transport: Arc<dyn HttpTransport>,
    state: Mutex<State>,
}

impl RpcClient {
    /// Client over the given base URLs, using the production HTTP transport
    /// with a 30 second request timeout.
    pub fn new(endpoints: Vec<String>, retry: RetryConfig) -> Result<Self, RpcError> {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
        Self::with_transport(endpoints, retry, transport)
    }

    pub fn with_transport(
        endpoints: Vec<String>,
        retry: RetryConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, RpcError> {
        if endpoints.is_empty() {
            return Err(RpcError::NoEndpoints);
        }
        let endpoints: Vec<String> = endpoints
            .into_iter()
            .map(|e| e.trim_end_matches('/').to_string())
            .collect();
        let verified = vec![false; endpoints.len()];
        Ok(Self {
            endpoints,
            retry,
            transport,
            state: Mutex::new(State {
                chain_id: None,
                current: 0,
                verified,
                stats: RpcStats::default(),
            }),
        })
    }

    /// The chain id this client trusts, once one has been learned.
    pub async fn chain_id(&self) -> Option<String> {
        self.state.lock().await.chain_id.clone()
    }

    pub async fn stats(&self) -> RpcStats {
        self.state.lock().await.stats
    }

    /// Issue `path` against the endpoint list with verification, retry, and
    /// failover. Counters accumulate locally and fold into the shared state
    /// when the call settles; the state lock is never held across a network
    /// exchange, so calls on one client can overlap.
    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, RpcError> {
        let mut local = RpcStats::default();
        let mut last_err: Option<RpcError> = None;
        let mut index = self.state.lock().await.current;

        while index < self.endpoints.len() {
            let url = &self.endpoints[index];

            if !self.state.lock().await.verified[index] {
                match self.execute::<Value>(url, GET_INFO, None, &mut local).await {
                    Ok(raw) => {
                        let info: ChainInfo = match serde_json::from_value(raw.clone()) {
                            Ok(info) => info,
                            Err(e) => {
                                self.merge(local).await;
                                return Err(RpcError::Decode {
                                    path: GET_INFO.into(),
                                    source: e,
                                });
                            }
                        };
                        let mismatch = {
                            let mut state = self.state.lock().await;
                            match &state.chain_id {
                                None => {
                                    tracing::debug!(url = %url, chain_id = %info.chain_id, "chain id learned");
                                    state.chain_id = Some(info.chain_id.clone());
                                    state.verified[index] = true;
                                    None
                                }
                                Some(expected) if *expected == info.chain_id => {
                                    state.verified[index] = true;
                                    None
                                }
                                Some(expected) => Some(expected.clone()),
                            }
                        };
                        if let Some(expected) = mismatch {
                            tracing::warn!(
                                url = %url,
                                expected = %expected,
                                got = %info.chain_id,
                                "chain id mismatch, skipping endpoint"
                            );
                            last_err = Some(RpcError::ChainIdMismatch {
                                url: url.clone(),
                                expected,
                                got: info.chain_id,
                            });
                            index += 1;
                            local.failovers += 1;
                            continue;
                        }
                        // The verification response doubles as the answer
                        // when the call itself is get_info.
                        if path == GET_INFO {
                            self.settle(index, local).await;
                            return serde_json::from_value(raw).map_err(|e| RpcError::Decode {
                                path: GET_INFO.into(),
                                source: e,
                            });
                        }
                    }
                    Err(e) if e.is_connection_failure() => {
                        last_err = Some(e);
                        index += 1;
                        local.failovers += 1;
                        continue;
                    }
                    Err(e) => {
                        self.merge(local).await;
                        return Err(e);
                    }
                }
            }

            match self.execute::<T>(url, path, body.as_ref(), &mut local).await {
                Ok(value) => {
                    self.settle(index, local).await;
                    return Ok(value);
                }
                Err(e) if e.is_connection_failure() => {
                    tracing::warn!(url = %url, error = %e, "endpoint exhausted, failing over");
                    last_err = Some(e);
                    index += 1;
                    local.failovers += 1;
                }
                // Status and decode errors are final for the whole call.
                Err(e) => {
                    self.merge(local).await;
                    return Err(e);
                }
            }
        }

        {
            let mut state = self.state.lock().await;
            state.current = 0;
            state.verified.fill(false);
            state.stats.attempts += local.attempts;
            state.stats.failovers += local.failovers;
        }
        Err(RpcError::Exhausted {
            attempts: local.attempts,
            failovers: local.failovers,
            last: Box::new(last_err.unwrap_or(RpcError::NoEndpoints)),
        })
    }

    /// Fold a successful call's counters into the shared stats, remembering
    /// the endpoint that served it.
    async fn settle(&self, index: usize, local: RpcStats) {
        let mut state = self.state.lock().await;
        state.current = index;
        state.stats.attempts += local.attempts;
        state.stats.failovers += local.failovers;
    }

    async fn merge(&self, local: RpcStats) {
        let mut state = self.state.lock().await;
        state.stats.attempts += local.attempts;
        state.stats.failovers += local.failovers;
    }

    /// One endpoint, up to `retry.attempts` attempts.
    async fn execute<T: DeserializeOwned>(
        &self,
        url: &str,
        path: &str,
        body: Option<&Value>,
        stats: &mut RpcStats,
    ) -> Result<T, RpcError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            stats.attempts += 1;
            let outcome: Result<std::convert::Infallible, RpcError> =
                match self.transport.post(url, path, body).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    return serde_json::from_slice(&response.body).map_err(|e| {
                        RpcError::Decode {
                            path: path.into(),
                            source: e,
                        }
                    });
                }
                Ok(response) => Err(RpcError::Status {
                    url: url.into(),
                    path: path.into(),
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                }),
                Err(e) => Err(e),
            };

            let err = outcome.unwrap_err();
            let transient = err.is_connection_failure()
                || matches!(
                    &err,
                    RpcError::Status { status, .. }
                        if self.retry.retryable_statuses.contains(status)
                );
            if !transient || attempt >= self.retry.attempts {
                return Err(err);
            }
            tracing::warn!(
                attempt,
                delay_ms = self.retry.delay.as_millis() as u64,
                error = %err,
                url = %url,
                "retrying request"
            );
            tokio::time::sleep(self.retry.delay).await;
        }
    }
}

/// The typed chain API surface the transaction layer consumes. Object safe;
/// hold as `Arc<dyn RpcProvider>`.
#[async_trait]
pub trait RpcProvider: Send + Sync {
    async fn get_info(&self) -> Result<ChainInfo, RpcError>;
    async fn get_block(&self, block_num_or_id: &str) -> Result<Block, RpcError>;
    async fn get_raw_abi(&self, account: &str) -> Result<RawAbi, RpcError>;
    async fn get_required_keys(
        &self,
        transaction: Value,
        available_keys: &[String],
    ) -> Result<RequiredKeys, RpcError>;
    async fn push_transaction(
        &self,
        request: &PackedTransaction,
    ) -> Result<TransactionResponse, RpcError>;
    async fn send_transaction(
        &self,
        request: &PackedTransaction,
    ) -> Result<TransactionResponse, RpcError>;
    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, RpcError>;
}

#[async_trait]
impl RpcProvider for RpcClient {
    async fn get_info(&self) -> Result<ChainInfo, RpcError> {
        self.call(GET_INFO, None).await
    }

    async fn get_block(&self, block_num_or_id: &str) -> Result<Block, RpcError> {
        self.call(
            "/v1/chain/get_block",
            Some(json!({ "block_num_or_id": block_num_or_id })),
        )
        .await
    }

    async fn get_raw_abi(&self, account: &str) -> Result<RawAbi, RpcError> {
        self.call(
            "/v1/chain/get_raw_abi",
            Some(json!({ "account_name": account })),
        )
        .await
    }

    async fn get_required_keys(
        &self,
        transaction: Value,
        available_keys: &[String],
    ) -> Result<RequiredKeys, RpcError> {
        self.call(
            "/v1/chain/get_required_keys",
            Some(json!({
                "transaction": transaction,
                "available_keys": available_keys,
            })),
        )
        .await
    }

    async fn push_transaction(
        &self,
        request: &PackedTransaction,
    ) -> Result<TransactionResponse, RpcError> {
        let body = serde_json::to_value(request).map_err(|e| RpcError::Decode {
            path: "/v1/chain/push_transaction".into(),
            source: e,
        })?;
        self.call("/v1/chain/push_transaction", Some(body)).await
    }

    async fn send_transaction(
        &self,
        request: &PackedTransaction,
    ) -> Result<TransactionResponse, RpcError> {
        let body = serde_json::to_value(request).map_err(|e| RpcError::Decode {
            path: "/v1/chain/send_transaction".into(),
            source: e,
        })?;
        self.call("/v1/chain/send_transaction", Some(body)).await
    }

    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, RpcError> {
        let body = serde_json::to_value(request).map_err(|e| RpcError::Decode {
            path: "/v1/chain/get_table_rows".into(),
            source: e,
        })?;
        self.call("/v1/chain/get_table_rows", Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;

    const CHAIN_A: &str = "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";
    const CHAIN_B: &str = "e70aaab8997e1dfce58fbfac80cbbb8fecec7b99cf982a9444273cbc64c41473";

    enum Step {
        Respond(u16, String),
        Fail,
    }

    /// Scripted transport: a queue of steps per (url, path).
    #[derive(Default)]
    struct MockTransport {
        scripts: StdMutex<HashMap<(String, String), VecDeque<Step>>>,
    }

    impl MockTransport {
        fn script(&self, url: &str, path: &str, step: Step) {
            self.scripts
                .lock()
                .unwrap()
                .entry((url.into(), path.into()))
                .or_default()
                .push_back(step);
        }

        fn info_body(chain_id: &str) -> String {
            format!(
                r#"{{"chain_id":"{chain_id}","head_block_num":100,"head_block_time":"2019-02-26T18:31:50.000"}}"#
            )
        }

        fn remaining(&self, url: &str, path: &str) -> usize {
            self.scripts
                .lock()
                .unwrap()
                .get(&(url.into(), path.into()))
                .map_or(0, VecDeque::len)
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn post(
            &self,
            url: &str,
            path: &str,
            _body: Option<&Value>,
        ) -> Result<HttpResponse, RpcError> {
            let step = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&(url.into(), path.into()))
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("unscripted call: {url}{path}"));
            match step {
                Step::Respond(status, body) => Ok(HttpResponse {
                    status,
                    body: body.into_bytes(),
                }),
                Step::Fail => Err(RpcError::Connection {
                    url: url.into(),
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig {
            attempts,
            delay: Duration::ZERO,
            retryable_statuses: HashSet::new(),
        }
    }

    fn client(urls: &[&str], transport: Arc<MockTransport>, retry: RetryConfig) -> RpcClient {
        RpcClient::with_transport(
            urls.iter().map(|u| u.to_string()).collect(),
            retry,
            transport,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn learns_chain_id_on_first_call() {
        let transport = Arc::new(MockTransport::default());
        transport.script(
            "http://one",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        transport.script(
            "http://one",
            "/v1/chain/get_block",
            Step::Respond(200, r#"{"block_num":97,"ref_block_prefix":306112488}"#.into()),
        );

        let client = client(&["http://one"], transport, fast_retry(3));
        assert!(client.chain_id().await.is_none());

        let block = client.get_block("97").await.unwrap();
        assert_eq!(block.ref_block_prefix, 306112488);
        assert_eq!(client.chain_id().await.as_deref(), Some(CHAIN_A));
        assert_eq!(
            client.stats().await,
            RpcStats {
                attempts: 2,
                failovers: 0
            }
        );
    }

    #[tokio::test]
    async fn chain_id_mismatch_failover_scenario() {
        // Endpoint one establishes the chain id, then goes dark. Endpoint two
        // answers for a different chain. Endpoint three matches and serves.
        let transport = Arc::new(MockTransport::default());
        let attempts = 3;

        transport.script(
            "http://one",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        transport.script(
            "http://one",
            "/v1/chain/get_block",
            Step::Respond(200, r#"{"block_num":97,"ref_block_prefix":1}"#.into()),
        );
        for _ in 0..attempts {
            transport.script("http://one", "/v1/chain/get_block", Step::Fail);
        }
        transport.script(
            "http://two",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_B)),
        );
        transport.script(
            "http://three",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        transport.script(
            "http://three",
            "/v1/chain/get_block",
            Step::Respond(200, r#"{"block_num":98,"ref_block_prefix":2}"#.into()),
        );

        let client = client(
            &["http://one", "http://two", "http://three"],
            Arc::clone(&transport),
            fast_retry(attempts),
        );

        client.get_block("97").await.unwrap();
        let baseline = client.stats().await;

        let block = client.get_block("98").await.unwrap();
        assert_eq!(block.block_num, 98);

        let stats = client.stats().await;
        // Endpoint one: exactly `attempts` tries. Endpoint two: exactly one
        // get_info, no retries on mismatch. Endpoint three: verify + call.
        assert_eq!(stats.failovers - baseline.failovers, 2);
        assert_eq!(stats.attempts - baseline.attempts, attempts as u64 + 3);
        assert_eq!(transport.remaining("http://two", GET_INFO), 0);
    }

    #[tokio::test]
    async fn status_errors_are_terminal() {
        for status in [500u16, 501, 418, 401] {
            let transport = Arc::new(MockTransport::default());
            transport.script(
                "http://one",
                GET_INFO,
                Step::Respond(200, MockTransport::info_body(CHAIN_A)),
            );
            transport.script(
                "http://one",
                "/v1/chain/get_block",
                Step::Respond(status, "oops".into()),
            );

            let client = client(
                &["http://one", "http://two"],
                Arc::clone(&transport),
                fast_retry(3),
            );
            let err = client.get_block("1").await.unwrap_err();
            assert!(
                matches!(err, RpcError::Status { status: s, .. } if s == status),
                "expected status error for {status}"
            );

            // One verification call plus one failed call; no retries, no
            // failover to endpoint two.
            let stats = client.stats().await;
            assert_eq!(stats.attempts, 2);
            assert_eq!(stats.failovers, 0);
        }
    }

    #[tokio::test]
    async fn configured_retryable_status_is_retried() {
        let transport = Arc::new(MockTransport::default());
        transport.script(
            "http://one",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        transport.script("http://one", "/v1/chain/get_block", Step::Respond(500, "busy".into()));
        transport.script(
            "http://one",
            "/v1/chain/get_block",
            Step::Respond(200, r#"{"block_num":97,"ref_block_prefix":1}"#.into()),
        );

        let retry = RetryConfig {
            attempts: 3,
            delay: Duration::ZERO,
            retryable_statuses: [500].into_iter().collect(),
        };
        let client = client(&["http://one"], transport, retry);
        let block = client.get_block("97").await.unwrap();
        assert_eq!(block.block_num, 97);
    }

    #[tokio::test]
    async fn decode_failure_does_not_retry_or_fail_over() {
        let transport = Arc::new(MockTransport::default());
        transport.script(
            "http://one",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        transport.script(
            "http://one",
            "/v1/chain/get_block",
            Step::Respond(200, "not json".into()),
        );

        let client = client(&["http://one", "http://two"], transport, fast_retry(3));
        let err = client.get_block("1").await.unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
        assert_eq!(client.stats().await.failovers, 0);
    }

    #[tokio::test]
    async fn exhaustion_reports_counts_and_resets() {
        let transport = Arc::new(MockTransport::default());
        let attempts = 2;
        for _ in 0..attempts {
            transport.script("http://one", GET_INFO, Step::Fail);
            transport.script("http://two", GET_INFO, Step::Fail);
        }

        let client = client(
            &["http://one", "http://two"],
            Arc::clone(&transport),
            fast_retry(attempts),
        );
        let err = client.get_info().await.unwrap_err();
        match err {
            RpcError::Exhausted {
                attempts: a,
                failovers,
                last,
            } => {
                assert_eq!(a, attempts as u64 * 2);
                assert_eq!(failovers, 2);
                assert!(last.is_connection_failure());
            }
            other => panic!("expected Exhausted, got {other}"),
        }

        // After exhaustion the client starts over from the first endpoint.
        transport.script(
            "http://one",
            GET_INFO,
            Step::Respond(200, MockTransport::info_body(CHAIN_A)),
        );
        let info = client.get_info().await.unwrap();
        assert_eq!(info.chain_id, CHAIN_A);
    }

    /// Answers `get_info` immediately; block requests complete only once two
    /// of them are in flight at the same time.
    struct RendezvousTransport {
        barrier: tokio::sync::Barrier,
    }

    #[async_trait]
    impl HttpTransport for RendezvousTransport {
        async fn post(
            &self,
            _url: &str,
            path: &str,
            _body: Option<&Value>,
        ) -> Result<HttpResponse, RpcError> {
            let body = if path == GET_INFO {
                MockTransport::info_body(CHAIN_A)
            } else {
                self.barrier.wait().await;
                r#"{"block_num":97,"ref_block_prefix":1}"#.to_string()
            };
            Ok(HttpResponse {
                status: 200,
                body: body.into_bytes(),
            })
        }
    }

    #[tokio::test]
    async fn calls_on_one_client_overlap() {
        let transport = Arc::new(RendezvousTransport {
            barrier: tokio::sync::Barrier::new(2),
        });
        let client =
            RpcClient::with_transport(vec!["http://one".into()], fast_retry(1), transport)
                .unwrap();
        // Verify the endpoint up front so both block requests go straight
        // through.
        client.get_info().await.unwrap();

        // Each block request parks on the barrier until the other arrives,
        // so this only finishes if the client does not serialize its calls.
        let (a, b) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(client.get_block("97"), client.get_block("97"))
        })
        .await
        .expect("block requests never overlapped");
        assert_eq!(a.unwrap().block_num, 97);
        assert_eq!(b.unwrap().block_num, 97);
        assert_eq!(client.stats().await.attempts, 3);
    }

    #[tokio::test]
    async fn empty_endpoint_list_rejected() {
        let transport: Arc<dyn HttpTransport> = Arc::new(MockTransport::default());
        assert!(matches!(
            RpcClient::with_transport(vec![], RetryConfig::default(), transport),
            Err(RpcError::NoEndpoints)
        ));
    }
}
