//! Typed request and response models for the chain API, plus the narrow view
//! traits the transaction layer consumes.
//!
//! Wire names are snake_case as served by chain nodes. Response structs keep
//! only the fields the library acts on; anything else a node adds is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `/v1/chain/get_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u64,
    pub head_block_time: String,
    #[serde(default)]
    pub last_irreversible_block_num: u64,
    #[serde(default)]
    pub head_block_id: String,
}

/// Response of `/v1/chain/get_block`.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub block_num: u64,
    pub ref_block_prefix: u32,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub producer: String,
}

/// Response of `/v1/chain/get_raw_abi`: the ABI blob plus its declared hash.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAbi {
    pub account_name: String,
    #[serde(default)]
    pub code_hash: String,
    pub abi_hash: String,
    /// Base64 of the binary ABI.
    pub abi: String,
}

/// Response of `/v1/chain/get_required_keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequiredKeys {
    pub required_keys: Vec<String>,
}

/// The packed transaction envelope submitted to `push_transaction` /
/// `send_transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedTransaction {
    pub signatures: Vec<String>,
    /// 0 = none. Compression is out of scope for this client.
    pub compression: u8,
    pub packed_context_free_data: String,
    /// Hex of the serialized transaction.
    pub packed_trx: String,
}

/// Response of `push_transaction` / `send_transaction`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: Option<Value>,
}

/// Request body for `/v1/chain/get_table_rows`.
#[derive(Debug, Clone, Serialize)]
pub struct TableRowsRequest {
    pub json: bool,
    pub code: String,
    pub scope: String,
    pub table: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lower_bound: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub upper_bound: String,
    pub limit: u32,
}

impl TableRowsRequest {
    pub fn new(code: &str, scope: &str, table: &str) -> Self {
        Self {
            json: true,
            code: code.into(),
            scope: scope.into(),
            table: table.into(),
            lower_bound: String::new(),
            upper_bound: String::new(),
            limit: 10,
        }
    }
}

/// Response of `/v1/chain/get_table_rows`.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRows {
    pub rows: Vec<Value>,
    #[serde(default)]
    pub more: bool,
}

/// The slice of `get_info` the transaction model needs.
pub trait ChainInfoView {
    fn chain_id(&self) -> &str;
    fn head_block_num(&self) -> u64;
    fn head_block_time(&self) -> &str;
}

impl ChainInfoView for ChainInfo {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn head_block_num(&self) -> u64 {
        self.head_block_num
    }

    fn head_block_time(&self) -> &str {
        &self.head_block_time
    }
}

/// The slice of `get_block` the transaction model needs for TAPOS.
pub trait BlockView {
    fn block_num(&self) -> u64;
    fn ref_block_prefix(&self) -> u32;
}

impl BlockView for Block {
    fn block_num(&self) -> u64 {
        self.block_num
    }

    fn ref_block_prefix(&self) -> u32 {
        self.ref_block_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_info_ignores_extra_fields() {
        let info: ChainInfo = serde_json::from_str(
            r#"{
                "server_version": "cafe",
                "chain_id": "abc123",
                "head_block_num": 100,
                "head_block_time": "2019-02-26T18:31:50.000",
                "last_irreversible_block_num": 90,
                "head_block_id": "00000064",
                "virtual_block_cpu_limit": 200000000
            }"#,
        )
        .unwrap();
        assert_eq!(info.chain_id(), "abc123");
        assert_eq!(info.head_block_num(), 100);
    }

    #[test]
    fn block_view_exposes_tapos_fields() {
        let block: Block = serde_json::from_str(
            r#"{"block_num": 97, "ref_block_prefix": 306112488, "id": "0061"}"#,
        )
        .unwrap();
        assert_eq!(block.block_num(), 97);
        assert_eq!(block.ref_block_prefix(), 306112488);
    }

    #[test]
    fn table_rows_request_omits_empty_bounds() {
        let body =
            serde_json::to_value(TableRowsRequest::new("eosio.token", "todd", "accounts"))
                .unwrap();
        assert!(body.get("lower_bound").is_none());
        assert_eq!(body["limit"], 10);
    }
}
