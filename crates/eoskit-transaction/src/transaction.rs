//! The transaction model and its prepare/sign/broadcast lifecycle.
//!
//! A transaction is built empty, mutated by the caller (actions, TAPOS,
//! resource limits), prepared against a chain (TAPOS + expiration from live
//! chain state), packed exactly once into the binary envelope, signed by an
//! external signature provider, and broadcast. It cannot be packed unless
//! every action's data is serialized, both TAPOS fields are non-zero, and
//! the expiration is after the epoch.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use eoskit_abi::{AbiRegistry, SerializationError, SerializationProvider};
use eoskit_core::Name;
use eoskit_rpc::{BlockView, ChainInfoView, PackedTransaction, RpcProvider};
use serde_json::{json, Value};

use crate::abi_provider::AbiProvider;
use crate::action::{Action, Authorization};
use crate::error::TransactionError;
use crate::signature::{BinaryAbi, SignatureProvider, SignatureRequest};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// How `prepare` derives TAPOS and expiration from chain state.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many blocks behind the head to anchor TAPOS on.
    pub blocks_behind: u64,
    /// Expiration window from the head block time.
    pub expire_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blocks_behind: 3,
            expire_seconds: 300,
        }
    }
}

/// An opaque transaction extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub tag: u16,
    pub data: Vec<u8>,
}

/// A chain transaction: ordered actions plus TAPOS and resource fields,
/// with an embedded ABI registry scoped to this instance.
pub struct Transaction {
    pub chain_id: String,
    pub expiration: DateTime<Utc>,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Vec<Extension>,
    pub signatures: Vec<String>,
    /// Set by a successful broadcast.
    pub transaction_id: Option<String>,
    /// Whether a signature provider may return an altered transaction.
    pub allow_transaction_modification: bool,
    pub config: Config,
    abis: AbiRegistry,
    /// The bytes that were actually signed (may differ from a fresh pack if
    /// the signer modified the transaction).
    signed_transaction: Option<Vec<u8>>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            chain_id: String::new(),
            expiration: DateTime::UNIX_EPOCH,
            ref_block_num: 0,
            ref_block_prefix: 0,
            max_net_usage_words: 0,
            max_cpu_usage_ms: 0,
            delay_sec: 0,
            context_free_actions: Vec::new(),
            actions: Vec::new(),
            transaction_extensions: Vec::new(),
            signatures: Vec::new(),
            transaction_id: None,
            allow_transaction_modification: false,
            config: Config::default(),
            abis: AbiRegistry::new(),
            signed_transaction: None,
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn add_context_free_action(&mut self, action: Action) {
        self.context_free_actions.push(action);
    }

    pub fn abis(&self) -> &AbiRegistry {
        &self.abis
    }

    pub fn abis_mut(&mut self) -> &mut AbiRegistry {
        &mut self.abis
    }

    /// Accounts of all actions in execution order, duplicates preserved.
    pub fn action_accounts(&self) -> Vec<String> {
        self.context_free_actions
            .iter()
            .chain(&self.actions)
            .map(|a| a.account.to_string())
            .collect()
    }

    /// Action accounts with no ABI in the registry yet.
    pub fn action_accounts_missing_abis(&self) -> Vec<String> {
        self.abis.missing_abis(&self.action_accounts())
    }

    /// `account::name` of every action still carrying structured data.
    pub fn actions_without_serialized_data(&self) -> Vec<String> {
        self.context_free_actions
            .iter()
            .chain(&self.actions)
            .filter(|a| !a.is_data_serialized())
            .map(|a| format!("{}::{}", a.account, a.name))
            .collect()
    }

    /// Serialize every action's data against the registry. All-or-nothing:
    /// if any action's contract ABI is missing, nothing is serialized and
    /// the missing accounts are enumerated in the error.
    pub fn serialize_action_data(
        &mut self,
        provider: &dyn SerializationProvider,
    ) -> Result<(), TransactionError> {
        let missing = self.action_accounts_missing_abis();
        if !missing.is_empty() {
            return Err(SerializationError::MissingAbis { accounts: missing }.into());
        }
        for action in self
            .context_free_actions
            .iter_mut()
            .chain(self.actions.iter_mut())
        {
            if !action.is_data_serialized() {
                let abi = self.abis.abi(action.account.as_str())?;
                action.serialize_data(abi, provider)?;
            }
        }
        Ok(())
    }

    /// Fetch any missing contract ABIs into the registry.
    pub async fn fetch_abis(&mut self, provider: &AbiProvider) -> Result<(), TransactionError> {
        let missing = self.action_accounts_missing_abis();
        if missing.is_empty() {
            return Ok(());
        }
        if self.chain_id.is_empty() {
            return Err(TransactionError::MissingChainId);
        }
        let fetched = provider.get_abis(&self.chain_id, &missing).await?;
        for (account, bytes) in fetched {
            self.abis.add_abi_bytes(&account, bytes)?;
        }
        Ok(())
    }

    /// Async variant of [`serialize_action_data`](Self::serialize_action_data):
    /// fetches missing ABIs first, then runs the synchronous path exactly
    /// once.
    pub async fn serialize_action_data_with(
        &mut self,
        serializer: &dyn SerializationProvider,
        abi_provider: &AbiProvider,
    ) -> Result<(), TransactionError> {
        self.fetch_abis(abi_provider).await?;
        self.serialize_action_data(serializer)
    }

    /// Learn or verify the chain id and derive the expiration window from a
    /// head-state view. Fields the caller already set are left alone.
    pub fn apply_chain_info(&mut self, info: &dyn ChainInfoView) -> Result<(), TransactionError> {
        if self.chain_id.is_empty() {
            self.chain_id = info.chain_id().to_string();
        } else if self.chain_id != info.chain_id() {
            return Err(TransactionError::ChainIdChanged {
                expected: self.chain_id.clone(),
                got: info.chain_id().to_string(),
            });
        }
        if self.expiration <= DateTime::UNIX_EPOCH {
            let head_time = parse_time(info.head_block_time())?;
            self.expiration = head_time + Duration::seconds(self.config.expire_seconds);
        }
        Ok(())
    }

    /// Anchor TAPOS on a block view.
    pub fn apply_tapos(&mut self, block: &dyn BlockView) {
        self.ref_block_num = (block.block_num() & 0xffff) as u16;
        self.ref_block_prefix = block.ref_block_prefix();
        tracing::debug!(
            ref_block_num = self.ref_block_num,
            ref_block_prefix = self.ref_block_prefix,
            "TAPOS derived"
        );
    }

    /// Derive chain id, expiration, and TAPOS from live chain state. Fields
    /// the caller already set are left alone.
    pub async fn prepare(&mut self, rpc: &dyn RpcProvider) -> Result<(), TransactionError> {
        let info = rpc.get_info().await?;
        self.apply_chain_info(&info)?;

        if self.ref_block_num == 0 || self.ref_block_prefix == 0 {
            let anchor = info.head_block_num().saturating_sub(self.config.blocks_behind);
            let block = rpc.get_block(&anchor.to_string()).await?;
            self.apply_tapos(&block);
        }
        Ok(())
    }

    fn check_packable(&self) -> Result<(), TransactionError> {
        if let Some(unserialized) = self.actions_without_serialized_data().into_iter().next() {
            let (account, name) = unserialized
                .split_once("::")
                .map(|(a, n)| (a.to_string(), n.to_string()))
                .unwrap_or((unserialized, String::new()));
            return Err(TransactionError::UnserializedAction { account, name });
        }
        if self.ref_block_num == 0 || self.ref_block_prefix == 0 {
            return Err(TransactionError::MissingTapos);
        }
        if self.expiration <= DateTime::UNIX_EPOCH {
            return Err(TransactionError::MissingExpiration);
        }
        Ok(())
    }

    /// The unpacked wire JSON form (hex action data), as sent to
    /// `get_required_keys`.
    pub fn to_json_value(&self) -> Result<Value, TransactionError> {
        let wire_actions = |actions: &[Action]| -> Result<Vec<Value>, TransactionError> {
            actions.iter().map(Action::to_wire_value).collect()
        };
        let extensions: Vec<Value> = self
            .transaction_extensions
            .iter()
            .map(|e| json!({ "type": e.tag, "data": hex::encode_upper(&e.data) }))
            .collect();
        Ok(json!({
            "expiration": format_time(self.expiration),
            "ref_block_num": self.ref_block_num,
            "ref_block_prefix": self.ref_block_prefix,
            "max_net_usage_words": self.max_net_usage_words,
            "max_cpu_usage_ms": self.max_cpu_usage_ms,
            "delay_sec": self.delay_sec,
            "context_free_actions": wire_actions(&self.context_free_actions)?,
            "actions": wire_actions(&self.actions)?,
            "transaction_extensions": extensions,
        }))
    }

    /// Pack into the binary transaction envelope.
    pub fn serialize(
        &self,
        serializer: &dyn SerializationProvider,
    ) -> Result<Vec<u8>, TransactionError> {
        self.check_packable()?;
        let json = self.to_json_value()?.to_string();
        let packed = serializer.serialize_transaction(&json)?;
        hex::decode(&packed)
            .map_err(|e| SerializationError::InvalidHex {
                reason: e.to_string(),
            })
            .map_err(TransactionError::from)
    }

    /// The broadcast envelope. Uses the signed bytes when present so a
    /// signer-modified transaction is what actually ships.
    pub fn to_request(
        &self,
        serializer: &dyn SerializationProvider,
    ) -> Result<PackedTransaction, TransactionError> {
        let packed = match &self.signed_transaction {
            Some(bytes) => bytes.clone(),
            None => self.serialize(serializer)?,
        };
        Ok(PackedTransaction {
            signatures: self.signatures.clone(),
            compression: 0,
            packed_context_free_data: String::new(),
            packed_trx: hex::encode_upper(packed),
        })
    }

    /// Obtain signatures from an external signature provider.
    pub async fn sign(
        &mut self,
        signer: &dyn SignatureProvider,
        rpc: &dyn RpcProvider,
        serializer: &dyn SerializationProvider,
    ) -> Result<(), TransactionError> {
        if self.chain_id.is_empty() {
            return Err(TransactionError::MissingChainId);
        }
        let packed = self.serialize(serializer)?;
        let available = signer.available_keys().await?;
        let required = rpc
            .get_required_keys(self.to_json_value()?, &available)
            .await?;

        let abis = self
            .abis
            .hex_abis()
            .into_iter()
            .map(|(account, abi)| BinaryAbi { account, abi })
            .collect();
        let response = signer
            .sign_transaction(SignatureRequest {
                chain_id: self.chain_id.clone(),
                serialized_transaction: packed.clone(),
                public_keys: required.required_keys,
                abis,
                is_modification_allowed: self.allow_transaction_modification,
            })
            .await?;

        if response.serialized_transaction != packed {
            if !self.allow_transaction_modification {
                return Err(TransactionError::ModifiedTransactionRejected);
            }
            tracing::debug!("accepting signer-modified transaction");
        }
        self.signed_transaction = Some(response.serialized_transaction);
        self.signatures = response.signatures;
        Ok(())
    }

    /// Submit via `push_transaction`; on success the transaction id is
    /// recorded and returned.
    pub async fn broadcast(
        &mut self,
        rpc: &dyn RpcProvider,
        serializer: &dyn SerializationProvider,
    ) -> Result<String, TransactionError> {
        if self.signatures.is_empty() {
            return Err(TransactionError::NotSigned);
        }
        let request = self.to_request(serializer)?;
        let response = rpc.push_transaction(&request).await?;
        self.transaction_id = Some(response.transaction_id.clone());
        Ok(response.transaction_id)
    }

    pub async fn sign_and_broadcast(
        &mut self,
        signer: &dyn SignatureProvider,
        rpc: &dyn RpcProvider,
        serializer: &dyn SerializationProvider,
    ) -> Result<String, TransactionError> {
        self.sign(signer, rpc, serializer).await?;
        self.broadcast(rpc, serializer).await
    }

    /// Rebuild a transaction from packed bytes. Action data stays in its
    /// serialized form; the chain id is not recoverable from the bytes.
    pub fn deserialize(
        bytes: &[u8],
        serializer: &dyn SerializationProvider,
    ) -> Result<Self, TransactionError> {
        let json = serializer.deserialize_transaction(&hex::encode_upper(bytes))?;
        let value: Value = serde_json::from_str(&json).map_err(SerializationError::from)?;

        let mut transaction = Transaction::new();
        transaction.expiration = parse_time(str_field(&value, "expiration")?)?;
        transaction.ref_block_num = u64_field(&value, "ref_block_num")? as u16;
        transaction.ref_block_prefix = u64_field(&value, "ref_block_prefix")? as u32;
        transaction.max_net_usage_words = u64_field(&value, "max_net_usage_words")? as u32;
        transaction.max_cpu_usage_ms = u64_field(&value, "max_cpu_usage_ms")? as u8;
        transaction.delay_sec = u64_field(&value, "delay_sec")? as u32;
        transaction.context_free_actions = wire_actions(&value, "context_free_actions")?;
        transaction.actions = wire_actions(&value, "actions")?;
        transaction.transaction_extensions = wire_extensions(&value)?;
        Ok(transaction)
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.naive_utc().format(TIME_FORMAT).to_string()
}

fn parse_time(text: &str) -> Result<DateTime<Utc>, TransactionError> {
    let trimmed = text.strip_suffix('Z').unwrap_or(text);
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| TransactionError::InvalidTimestamp { text: text.into() })
}

fn decode_error(reason: String) -> TransactionError {
    SerializationError::InvalidValue {
        type_name: "transaction".into(),
        reason,
    }
    .into()
}

fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, TransactionError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error(format!("missing field '{field}'")))
}

fn u64_field(value: &Value, field: &str) -> Result<u64, TransactionError> {
    value
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| decode_error(format!("missing field '{field}'")))
}

fn wire_actions(value: &Value, field: &str) -> Result<Vec<Action>, TransactionError> {
    let entries = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| decode_error(format!("missing field '{field}'")))?;
    entries
        .iter()
        .map(|entry| {
            let account = Name::new(str_field(entry, "account")?)?;
            let name = Name::new(str_field(entry, "name")?)?;
            let authorization: Vec<Authorization> = serde_json::from_value(
                entry
                    .get("authorization")
                    .cloned()
                    .unwrap_or(Value::Array(Vec::new())),
            )
            .map_err(SerializationError::from)?;
            let data = hex::decode(str_field(entry, "data")?).map_err(|e| {
                TransactionError::from(SerializationError::InvalidHex {
                    reason: e.to_string(),
                })
            })?;
            Ok(Action::from_serialized(account, name, authorization, data))
        })
        .collect()
}

fn wire_extensions(value: &Value) -> Result<Vec<Extension>, TransactionError> {
    let entries = value
        .get("transaction_extensions")
        .and_then(Value::as_array)
        .ok_or_else(|| decode_error("missing field 'transaction_extensions'".into()))?;
    entries
        .iter()
        .map(|entry| {
            let tag = u64_field(entry, "type")? as u16;
            let data = hex::decode(str_field(entry, "data")?).map_err(|e| {
                TransactionError::from(SerializationError::InvalidHex {
                    reason: e.to_string(),
                })
            })?;
            Ok(Extension { tag, data })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use eoskit_abi::AbiSerializer;
    use eoskit_rpc::{
        Block, ChainInfo, RawAbi, RequiredKeys, RpcError, TableRows, TableRowsRequest,
        TransactionResponse,
    };
    use crate::error::SignatureProviderError;
    use crate::signature::SignatureResponse;
    use std::sync::Arc;

    const TOKEN_ABI: &str = r#"{
        "version": "eosio::abi/1.1",
        "structs": [
            {"name": "transfer", "base": "", "fields": [
                {"name": "from", "type": "name"},
                {"name": "to", "type": "name"},
                {"name": "quantity", "type": "asset"},
                {"name": "memo", "type": "string"}
            ]}
        ],
        "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}]
    }"#;

    const CHAIN: &str = "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";

    fn transfer_action(contract: &str) -> Action {
        Action::new(
            Name::new(contract).unwrap(),
            Name::new("transfer").unwrap(),
            vec![Authorization::active(Name::new("todd").unwrap()).unwrap()],
            serde_json::json!({
                "from": "todd",
                "to": "brandon",
                "quantity": "42.0000 SYS",
                "memo": ""
            }),
        )
    }

    fn ready_transaction() -> Transaction {
        let mut transaction = Transaction::new();
        transaction.chain_id = CHAIN.into();
        transaction.expiration = parse_time("2019-02-26T18:31:50.000").unwrap();
        transaction.ref_block_num = 40361;
        transaction.ref_block_prefix = 306112488;
        transaction
            .abis_mut()
            .add_abi_json("eosio.token", TOKEN_ABI)
            .unwrap();
        transaction.add_action(transfer_action("eosio.token"));
        transaction
            .serialize_action_data(&AbiSerializer::new())
            .unwrap();
        transaction
    }

    struct MockRpc;

    #[async_trait]
    impl RpcProvider for MockRpc {
        async fn get_info(&self) -> Result<ChainInfo, RpcError> {
            Ok(ChainInfo {
                chain_id: CHAIN.into(),
                head_block_num: 100,
                head_block_time: "2019-02-26T18:31:50.000".into(),
                last_irreversible_block_num: 90,
                head_block_id: String::new(),
            })
        }

        async fn get_block(&self, block_num_or_id: &str) -> Result<Block, RpcError> {
            assert_eq!(block_num_or_id, "97");
            Ok(Block {
                block_num: 97,
                ref_block_prefix: 306112488,
                id: String::new(),
                timestamp: String::new(),
                producer: String::new(),
            })
        }

        async fn get_raw_abi(&self, _account: &str) -> Result<RawAbi, RpcError> {
            unimplemented!("not used")
        }

        async fn get_required_keys(
            &self,
            _transaction: Value,
            available_keys: &[String],
        ) -> Result<RequiredKeys, RpcError> {
            Ok(RequiredKeys {
                required_keys: available_keys.to_vec(),
            })
        }

        async fn push_transaction(
            &self,
            request: &PackedTransaction,
        ) -> Result<TransactionResponse, RpcError> {
            assert!(!request.signatures.is_empty());
            Ok(TransactionResponse {
                transaction_id: "cafe0102".into(),
                processed: None,
            })
        }

        async fn send_transaction(
            &self,
            _request: &PackedTransaction,
        ) -> Result<TransactionResponse, RpcError> {
            unimplemented!("not used")
        }

        async fn get_table_rows(
            &self,
            _request: &TableRowsRequest,
        ) -> Result<TableRows, RpcError> {
            unimplemented!("not used")
        }
    }

    struct MockSigner {
        modify: bool,
    }

    #[async_trait]
    impl SignatureProvider for MockSigner {
        async fn available_keys(&self) -> Result<Vec<String>, SignatureProviderError> {
            Ok(vec!["PUB_K1_mockmockmock".into()])
        }

        async fn sign_transaction(
            &self,
            request: SignatureRequest,
        ) -> Result<SignatureResponse, SignatureProviderError> {
            let mut serialized = request.serialized_transaction;
            if self.modify {
                serialized.push(0xff);
            }
            Ok(SignatureResponse {
                signatures: vec!["SIG_K1_mockmockmock".into()],
                serialized_transaction: serialized,
            })
        }
    }

    #[test]
    fn missing_abi_is_all_or_nothing() {
        let mut transaction = Transaction::new();
        transaction
            .abis_mut()
            .add_abi_json("eosio.token", TOKEN_ABI)
            .unwrap();
        transaction.add_action(transfer_action("eosio.token"));
        transaction.add_action(transfer_action("other.token"));

        let err = transaction
            .serialize_action_data(&AbiSerializer::new())
            .unwrap_err();
        match err {
            TransactionError::Serialization(SerializationError::MissingAbis { accounts }) => {
                assert_eq!(accounts, ["other.token"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing was serialized, not even the action whose ABI is present.
        assert!(!transaction.actions[0].is_data_serialized());
    }

    #[test]
    fn packing_preconditions() {
        let mut transaction = ready_transaction();

        transaction.ref_block_num = 0;
        assert!(matches!(
            transaction.serialize(&AbiSerializer::new()),
            Err(TransactionError::MissingTapos)
        ));

        transaction.ref_block_num = 40361;
        transaction.expiration = DateTime::UNIX_EPOCH;
        assert!(matches!(
            transaction.serialize(&AbiSerializer::new()),
            Err(TransactionError::MissingExpiration)
        ));

        let mut unserialized = Transaction::new();
        unserialized.ref_block_num = 1;
        unserialized.ref_block_prefix = 1;
        unserialized.expiration = parse_time("2019-02-26T18:31:50.000").unwrap();
        unserialized.add_action(transfer_action("eosio.token"));
        assert!(matches!(
            unserialized.serialize(&AbiSerializer::new()),
            Err(TransactionError::UnserializedAction { .. })
        ));
    }

    #[test]
    fn packs_and_unpacks() {
        let transaction = ready_transaction();
        let serializer = AbiSerializer::new();
        let packed = transaction.serialize(&serializer).unwrap();

        let recovered = Transaction::deserialize(&packed, &serializer).unwrap();
        assert_eq!(recovered.ref_block_num, 40361);
        assert_eq!(recovered.ref_block_prefix, 306112488);
        assert_eq!(format_time(recovered.expiration), "2019-02-26T18:31:50.000");
        assert_eq!(recovered.actions.len(), 1);
        assert_eq!(recovered.actions[0].account.as_str(), "eosio.token");
        assert_eq!(
            recovered.actions[0].serialized_data(),
            transaction.actions[0].serialized_data()
        );
    }

    #[tokio::test]
    async fn prepare_derives_tapos_and_expiration() {
        let mut transaction = Transaction::new();
        transaction.add_action(transfer_action("eosio.token"));
        transaction.prepare(&MockRpc).await.unwrap();

        assert_eq!(transaction.chain_id, CHAIN);
        assert_eq!(transaction.ref_block_num, 97);
        assert_eq!(transaction.ref_block_prefix, 306112488);
        // head_block_time + default 300 second window.
        assert_eq!(format_time(transaction.expiration), "2019-02-26T18:36:50.000");
    }

    struct HeadState;

    impl ChainInfoView for HeadState {
        fn chain_id(&self) -> &str {
            CHAIN
        }

        fn head_block_num(&self) -> u64 {
            100
        }

        fn head_block_time(&self) -> &str {
            "2019-02-26T18:31:50.000"
        }
    }

    struct Anchor;

    impl BlockView for Anchor {
        fn block_num(&self) -> u64 {
            0x1_0061
        }

        fn ref_block_prefix(&self) -> u32 {
            306112488
        }
    }

    #[test]
    fn chain_state_views_drive_preparation() {
        let mut transaction = Transaction::new();
        transaction.apply_chain_info(&HeadState).unwrap();
        assert_eq!(transaction.chain_id, CHAIN);
        assert_eq!(format_time(transaction.expiration), "2019-02-26T18:36:50.000");

        transaction.apply_tapos(&Anchor);
        // ref_block_num keeps only the low 16 bits of the block number.
        assert_eq!(transaction.ref_block_num, 0x0061);
        assert_eq!(transaction.ref_block_prefix, 306112488);

        // A view reporting a different chain is rejected once one is learned.
        transaction.chain_id = "something-else".into();
        assert!(matches!(
            transaction.apply_chain_info(&HeadState),
            Err(TransactionError::ChainIdChanged { .. })
        ));
    }

    #[tokio::test]
    async fn populated_registry_needs_no_chain_id() {
        let mut transaction = Transaction::new();
        transaction
            .abis_mut()
            .add_abi_json("eosio.token", TOKEN_ABI)
            .unwrap();
        transaction.add_action(transfer_action("eosio.token"));

        // Every ABI is already local, so no fetch happens and the empty
        // chain id never matters.
        let provider = AbiProvider::new(Arc::new(MockRpc));
        transaction
            .serialize_action_data_with(&AbiSerializer::new(), &provider)
            .await
            .unwrap();
        assert!(transaction.actions[0].is_data_serialized());
    }

    #[tokio::test]
    async fn prepare_rejects_foreign_chain() {
        let mut transaction = Transaction::new();
        transaction.chain_id = "something-else".into();
        assert!(matches!(
            transaction.prepare(&MockRpc).await,
            Err(TransactionError::ChainIdChanged { .. })
        ));
    }

    #[tokio::test]
    async fn sign_and_broadcast_flow() {
        let mut transaction = ready_transaction();
        let serializer = AbiSerializer::new();

        let id = transaction
            .sign_and_broadcast(&MockSigner { modify: false }, &MockRpc, &serializer)
            .await
            .unwrap();
        assert_eq!(id, "cafe0102");
        assert_eq!(transaction.transaction_id.as_deref(), Some("cafe0102"));
        assert_eq!(transaction.signatures, ["SIG_K1_mockmockmock"]);
    }

    #[tokio::test]
    async fn modified_transaction_rejected_by_default() {
        let mut transaction = ready_transaction();
        let err = transaction
            .sign(&MockSigner { modify: true }, &MockRpc, &AbiSerializer::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransactionError::ModifiedTransactionRejected));
    }

    #[tokio::test]
    async fn modified_transaction_accepted_when_allowed() {
        let mut transaction = ready_transaction();
        transaction.allow_transaction_modification = true;
        transaction
            .sign(&MockSigner { modify: true }, &MockRpc, &AbiSerializer::new())
            .await
            .unwrap();

        // The broadcast envelope carries the modified bytes.
        let request = transaction.to_request(&AbiSerializer::new()).unwrap();
        assert!(request.packed_trx.ends_with("FF"));
    }

    #[tokio::test]
    async fn broadcast_requires_signatures() {
        let mut transaction = ready_transaction();
        assert!(matches!(
            transaction.broadcast(&MockRpc, &AbiSerializer::new()).await,
            Err(TransactionError::NotSigned)
        ));
    }
}
