//! Fetches contract ABIs over RPC, with verification and a per-chain cache.
//!
//! Batch fetches for distinct accounts run concurrently and fan in; the
//! first failure wins and no partial result is returned. Every fetched blob
//! is checked against the hash and account name the node declared before it
//! is cached or handed out.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use eoskit_core::checksum;
use eoskit_rpc::RpcProvider;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::AbiProviderError;

/// Cached, verified ABI fetcher.
pub struct AbiProvider {
    rpc: Arc<dyn RpcProvider>,
    cache: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl AbiProvider {
    pub fn new(rpc: Arc<dyn RpcProvider>) -> Self {
        Self {
            rpc,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The binary ABI for one account on one chain.
    pub async fn get_abi(
        &self,
        chain_id: &str,
        account: &str,
    ) -> Result<Vec<u8>, AbiProviderError> {
        let abis = self.get_abis(chain_id, &[account.to_string()]).await?;
        // get_abis returns every requested account or fails.
        Ok(abis.into_iter().next().map(|(_, bytes)| bytes).unwrap_or_default())
    }

    /// Binary ABIs for all `accounts`, keyed by account. Duplicate accounts
    /// collapse to one fetch. Either every account resolves or the first
    /// failure is returned.
    pub async fn get_abis(
        &self,
        chain_id: &str,
        accounts: &[String],
    ) -> Result<HashMap<String, Vec<u8>>, AbiProviderError> {
        let mut unique: Vec<&str> = Vec::new();
        for account in accounts {
            if !unique.contains(&account.as_str()) {
                unique.push(account);
            }
        }

        let mut result = HashMap::new();
        let mut misses: Vec<&str> = Vec::new();
        {
            let cache = self.cache.lock().await;
            for account in unique {
                match cache.get(&(chain_id.to_string(), account.to_string())) {
                    Some(bytes) => {
                        result.insert(account.to_string(), bytes.clone());
                    }
                    None => misses.push(account),
                }
            }
        }

        if misses.is_empty() {
            return Ok(result);
        }

        tracing::debug!(chain_id = %chain_id, count = misses.len(), "fetching ABIs");
        let fetched = try_join_all(misses.iter().map(|account| self.fetch_one(account))).await?;

        let mut cache = self.cache.lock().await;
        for (account, bytes) in misses.into_iter().zip(fetched) {
            cache.insert((chain_id.to_string(), account.to_string()), bytes.clone());
            result.insert(account.to_string(), bytes);
        }
        Ok(result)
    }

    async fn fetch_one(&self, account: &str) -> Result<Vec<u8>, AbiProviderError> {
        let raw = self.rpc.get_raw_abi(account).await?;
        if raw.account_name != account {
            return Err(AbiProviderError::AccountMismatch {
                requested: account.into(),
                echoed: raw.account_name,
            });
        }
        let bytes = BASE64
            .decode(&raw.abi)
            .map_err(|e| AbiProviderError::InvalidAbi {
                account: account.into(),
                reason: e.to_string(),
            })?;
        let computed = checksum::sha256_hex(&bytes);
        if !raw.abi_hash.eq_ignore_ascii_case(&computed) {
            return Err(AbiProviderError::HashMismatch {
                account: account.into(),
                declared: raw.abi_hash,
                computed,
            });
        }
        Ok(bytes)
    }
}
