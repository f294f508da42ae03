//! # eoskit-rpc
//!
//! Chain API client for EosKit: an ordered endpoint list with bounded
//! same-endpoint retries, sequential failover, and chain-identity
//! verification — once a chain id has been learned from one endpoint, any
//! endpoint answering for a different chain is skipped, never merged.
//!
//! The HTTP stack sits behind the [`HttpTransport`] trait so the failover
//! state machine is testable without a network. [`RpcProvider`] is the typed
//! surface the transaction layer consumes.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{RetryConfig, RpcClient, RpcProvider, RpcStats};
pub use error::RpcError;
pub use models::{
    Block, BlockView, ChainInfo, ChainInfoView, PackedTransaction, RawAbi, RequiredKeys,
    TableRows, TableRowsRequest, TransactionResponse,
};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
