//! The signature-provider capability.
//!
//! Key storage and signing algorithms live outside this library. A signer
//! only has to answer two questions: which public keys it controls, and what
//! the signatures for a packed transaction are. Providers may return a
//! modified transaction (for example after inserting an assert action); the
//! caller decides whether to accept it via
//! `Transaction::allow_transaction_modification`.

use async_trait::async_trait;

use crate::error::SignatureProviderError;

/// A contract ABI the signer may need to display the transaction.
#[derive(Debug, Clone)]
pub struct BinaryAbi {
    pub account: String,
    /// Uppercase hex of the binary ABI.
    pub abi: String,
}

/// Everything a signer needs to produce signatures.
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    pub chain_id: String,
    pub serialized_transaction: Vec<u8>,
    /// The public keys whose signatures are required.
    pub public_keys: Vec<String>,
    pub abis: Vec<BinaryAbi>,
    pub is_modification_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct SignatureResponse {
    pub signatures: Vec<String>,
    /// Echoed back; differs from the request only when the signer modified
    /// the transaction.
    pub serialized_transaction: Vec<u8>,
}

/// External signing capability. Object safe; hold as
/// `Arc<dyn SignatureProvider>`.
#[async_trait]
pub trait SignatureProvider: Send + Sync {
    /// The public keys this provider can sign with.
    async fn available_keys(&self) -> Result<Vec<String>, SignatureProviderError>;

    /// Sign a packed transaction.
    async fn sign_transaction(
        &self,
        request: SignatureRequest,
    ) -> Result<SignatureResponse, SignatureProviderError>;
}
