//! Actions and authorizations.
//!
//! An action's data lives in one of two forms: structured JSON (as authored
//! by the caller) or serialized bytes (as packed on the wire). `serialize_data`
//! moves from the first to the second and is idempotent — data that is
//! already serialized is left untouched.

use eoskit_abi::{AbiDef, SerializationError, SerializationProvider};
use eoskit_core::Name;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::TransactionError;

/// An actor/permission pair authorizing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub actor: Name,
    pub permission: Name,
}

impl Authorization {
    pub fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }

    /// `actor@active` convenience.
    pub fn active(actor: Name) -> Result<Self, eoskit_core::NameError> {
        Ok(Self {
            actor,
            permission: Name::new("active")?,
        })
    }
}

/// One contract action within a transaction.
#[derive(Debug, Clone)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<Authorization>,
    data: Value,
    serialized_data: Option<Vec<u8>>,
}

impl Action {
    /// Action with structured data, to be serialized against the contract
    /// ABI later.
    pub fn new(account: Name, name: Name, authorization: Vec<Authorization>, data: Value) -> Self {
        Self {
            account,
            name,
            authorization,
            data,
            serialized_data: None,
        }
    }

    /// Action whose data is already packed.
    pub fn from_serialized(
        account: Name,
        name: Name,
        authorization: Vec<Authorization>,
        serialized_data: Vec<u8>,
    ) -> Self {
        Self {
            account,
            name,
            authorization,
            data: Value::Null,
            serialized_data: Some(serialized_data),
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn serialized_data(&self) -> Option<&[u8]> {
        self.serialized_data.as_deref()
    }

    /// Uppercase hex of the serialized data, if any.
    pub fn hex_data(&self) -> Option<String> {
        self.serialized_data.as_deref().map(hex::encode_upper)
    }

    pub fn is_data_serialized(&self) -> bool {
        self.serialized_data.is_some()
    }

    /// Pack the structured data against the contract ABI. No-op when the
    /// data is already serialized.
    pub fn serialize_data(
        &mut self,
        abi: &AbiDef,
        provider: &dyn SerializationProvider,
    ) -> Result<(), TransactionError> {
        if self.serialized_data.is_some() {
            return Ok(());
        }
        if self.data.is_null() {
            return Err(TransactionError::MissingActionData {
                account: self.account.to_string(),
                name: self.name.to_string(),
            });
        }
        let json = self.data.to_string();
        let packed = provider.serialize(
            Some(self.account.as_str()),
            self.name.as_str(),
            None,
            &json,
            abi,
        )?;
        self.serialized_data =
            Some(hex::decode(&packed).map_err(|e| SerializationError::InvalidHex {
                reason: e.to_string(),
            })?);
        Ok(())
    }

    /// Recover structured data from the serialized bytes.
    pub fn deserialize_data(
        &mut self,
        abi: &AbiDef,
        provider: &dyn SerializationProvider,
    ) -> Result<(), TransactionError> {
        let bytes = self
            .serialized_data
            .as_deref()
            .ok_or_else(|| TransactionError::UnserializedAction {
                account: self.account.to_string(),
                name: self.name.to_string(),
            })?;
        let json = provider.deserialize(
            Some(self.account.as_str()),
            self.name.as_str(),
            None,
            &hex::encode_upper(bytes),
            abi,
        )?;
        self.data = serde_json::from_str(&json).map_err(SerializationError::from)?;
        Ok(())
    }

    /// The wire JSON form used by the transaction ABI and by
    /// `get_required_keys`.
    pub(crate) fn to_wire_value(&self) -> Result<Value, TransactionError> {
        let hex_data = self
            .hex_data()
            .ok_or_else(|| TransactionError::UnserializedAction {
                account: self.account.to_string(),
                name: self.name.to_string(),
            })?;
        Ok(json!({
            "account": self.account.as_str(),
            "name": self.name.as_str(),
            "authorization": self.authorization,
            "data": hex_data,
        }))
    }
}
