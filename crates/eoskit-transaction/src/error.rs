//! Error types for the transaction layer.

use eoskit_abi::{RegistryError, SerializationError};
use eoskit_core::NameError;
use eoskit_rpc::RpcError;
use thiserror::Error;

/// Errors building, preparing, signing, or broadcasting a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    AbiProvider(#[from] AbiProviderError),

    #[error(transparent)]
    SignatureProvider(#[from] SignatureProviderError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("Action {account}::{name} has no serialized data")]
    UnserializedAction { account: String, name: String },

    #[error("Action {account}::{name} has no structured data to serialize")]
    MissingActionData { account: String, name: String },

    #[error("ref_block_num and ref_block_prefix must be set (prepare the transaction first)")]
    MissingTapos,

    #[error("Transaction expiration is not set")]
    MissingExpiration,

    #[error("Transaction has no chain id (prepare the transaction first)")]
    MissingChainId,

    #[error("RPC endpoint serves chain {got}, but this transaction is for chain {expected}")]
    ChainIdChanged { expected: String, got: String },

    #[error("Cannot parse '{text}' as a timestamp")]
    InvalidTimestamp { text: String },

    #[error("Transaction has no signatures to broadcast")]
    NotSigned,

    #[error("Signature provider modified the transaction, which is not allowed")]
    ModifiedTransactionRejected,
}

/// Errors fetching and verifying contract ABIs.
#[derive(Debug, Error)]
pub enum AbiProviderError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("ABI for {account}: node declared hash {declared} but content hashes to {computed}")]
    HashMismatch {
        account: String,
        declared: String,
        computed: String,
    },

    #[error("Requested ABI for {requested} but the node answered for {echoed}")]
    AccountMismatch { requested: String, echoed: String },

    #[error("ABI payload for {account} is invalid: {reason}")]
    InvalidAbi { account: String, reason: String },
}

/// Failure reported by an external signature provider.
#[derive(Debug, Error)]
#[error("Signature provider failed: {reason}")]
pub struct SignatureProviderError {
    pub reason: String,
}

impl SignatureProviderError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
