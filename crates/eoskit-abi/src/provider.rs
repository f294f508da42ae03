//! The serialization capability consumed by the transaction layer.
//!
//! [`SerializationProvider`] is object safe so callers can hold
//! `Arc<dyn SerializationProvider + Send + Sync>` and swap implementations in
//! tests. [`AbiSerializer`] is the standard implementation, backed by
//! [`AbiCodec`] and the built-in protocol ABIs.

use crate::bootstrap;
use crate::codec::AbiCodec;
use crate::def::AbiDef;
use crate::error::SerializationError;
use crate::registry;

/// Converts action data, transactions, and ABIs between JSON and hex.
pub trait SerializationProvider {
    /// Encode `json` as uppercase hex. The target type is `type_name` when
    /// given, otherwise the data type the ABI declares for action `name`.
    fn serialize(
        &self,
        contract: Option<&str>,
        name: &str,
        type_name: Option<&str>,
        json: &str,
        abi: &AbiDef,
    ) -> Result<String, SerializationError>;

    /// Decode `hex` (either case) back to JSON. Type resolution matches
    /// [`serialize`](Self::serialize).
    fn deserialize(
        &self,
        contract: Option<&str>,
        name: &str,
        type_name: Option<&str>,
        hex: &str,
        abi: &AbiDef,
    ) -> Result<String, SerializationError>;

    /// Encode a transaction envelope (headers, actions, extensions) as hex.
    fn serialize_transaction(&self, json: &str) -> Result<String, SerializationError>;

    /// Decode a packed transaction back to JSON.
    fn deserialize_transaction(&self, hex: &str) -> Result<String, SerializationError>;

    /// Encode a JSON ABI to its canonical binary form, as hex.
    fn serialize_abi(&self, json: &str) -> Result<String, SerializationError>;

    /// Decode a binary ABI blob to JSON.
    fn deserialize_abi(&self, hex: &str) -> Result<String, SerializationError>;
}

/// The standard [`SerializationProvider`], driven entirely by ABI data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiSerializer;

impl AbiSerializer {
    pub fn new() -> Self {
        Self
    }

    fn resolve_type<'a>(
        contract: Option<&str>,
        name: &'a str,
        type_name: Option<&'a str>,
        abi: &'a AbiDef,
    ) -> Result<&'a str, SerializationError> {
        if let Some(ty) = type_name {
            return Ok(ty);
        }
        abi.type_for_action(name)
            .ok_or_else(|| SerializationError::ActionNotFound {
                contract: contract.unwrap_or_default().into(),
                action: name.into(),
            })
    }
}

impl SerializationProvider for AbiSerializer {
    fn serialize(
        &self,
        contract: Option<&str>,
        name: &str,
        type_name: Option<&str>,
        json: &str,
        abi: &AbiDef,
    ) -> Result<String, SerializationError> {
        let ty = Self::resolve_type(contract, name, type_name, abi)?;
        AbiCodec::new(abi).json_to_hex(ty, json)
    }

    fn deserialize(
        &self,
        contract: Option<&str>,
        name: &str,
        type_name: Option<&str>,
        hex: &str,
        abi: &AbiDef,
    ) -> Result<String, SerializationError> {
        let ty = Self::resolve_type(contract, name, type_name, abi)?;
        AbiCodec::new(abi).hex_to_json(ty, hex)
    }

    fn serialize_transaction(&self, json: &str) -> Result<String, SerializationError> {
        AbiCodec::new(bootstrap::transaction_abi()).json_to_hex("transaction", json)
    }

    fn deserialize_transaction(&self, hex: &str) -> Result<String, SerializationError> {
        AbiCodec::new(bootstrap::transaction_abi()).hex_to_json("transaction", hex)
    }

    fn serialize_abi(&self, json: &str) -> Result<String, SerializationError> {
        Ok(hex::encode_upper(registry::encode_abi(json)?))
    }

    fn deserialize_abi(&self, hex: &str) -> Result<String, SerializationError> {
        AbiCodec::new(bootstrap::abi_def_abi()).hex_to_json("abi_def", hex)
    }
}
