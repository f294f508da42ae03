//! Storage of validated contract ABIs, keyed by account name.
//!
//! Every ABI admitted to the registry is round-tripped through the `abi_def`
//! meta-ABI first, so anything stored is known to be decodable. The registry
//! keeps both the canonical binary blob (for hashing and re-serving) and the
//! parsed [`AbiDef`] (for driving a codec).

use crate::bootstrap;
use crate::codec::AbiCodec;
use crate::def::AbiDef;
use crate::error::{RegistryError, SerializationError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use eoskit_core::checksum;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    def: AbiDef,
}

/// Validated contract ABIs for the accounts a transaction touches.
#[derive(Debug, Clone, Default)]
pub struct AbiRegistry {
    abis: HashMap<String, Entry>,
}

impl AbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a binary ABI blob for `account`.
    pub fn add_abi_bytes(&mut self, account: &str, bytes: Vec<u8>) -> Result<(), RegistryError> {
        let def = decode_abi(&bytes).map_err(|source| RegistryError::InvalidAbi {
            name: account.into(),
            source,
        })?;
        self.abis.insert(account.into(), Entry { bytes, def });
        Ok(())
    }

    /// Validate and store a hex-encoded ABI blob (either case).
    pub fn add_abi_hex(&mut self, account: &str, hex_text: &str) -> Result<(), RegistryError> {
        let bytes = hex::decode(hex_text).map_err(|e| RegistryError::InvalidHex {
            reason: e.to_string(),
        })?;
        self.add_abi_bytes(account, bytes)
    }

    /// Validate and store a base64-encoded ABI blob.
    pub fn add_abi_base64(&mut self, account: &str, b64: &str) -> Result<(), RegistryError> {
        let bytes = BASE64.decode(b64).map_err(|e| RegistryError::InvalidBase64 {
            reason: e.to_string(),
        })?;
        self.add_abi_bytes(account, bytes)
    }

    /// Encode a JSON ABI to its canonical binary form and store it.
    pub fn add_abi_json(&mut self, account: &str, json: &str) -> Result<(), RegistryError> {
        let invalid = |source: SerializationError| RegistryError::InvalidAbi {
            name: account.into(),
            source,
        };
        let def = AbiDef::from_json(json).map_err(|e| invalid(e.into()))?;
        let bytes = encode_abi_def(&def).map_err(invalid)?;
        self.abis.insert(account.into(), Entry { bytes, def });
        Ok(())
    }

    pub fn contains(&self, account: &str) -> bool {
        self.abis.contains_key(account)
    }

    /// Accounts from `accounts` with no stored ABI, preserving input order
    /// and duplicates.
    pub fn missing_abis<S: AsRef<str>>(&self, accounts: &[S]) -> Vec<String> {
        accounts
            .iter()
            .map(|a| a.as_ref())
            .filter(|a| !self.abis.contains_key(*a))
            .map(String::from)
            .collect()
    }

    /// The parsed ABI for `account`.
    pub fn abi(&self, account: &str) -> Result<&AbiDef, RegistryError> {
        self.entry(account).map(|e| &e.def)
    }

    /// The stored binary blob as uppercase hex.
    pub fn hex_abi(&self, account: &str) -> Result<String, RegistryError> {
        self.entry(account).map(|e| hex::encode_upper(&e.bytes))
    }

    /// The stored ABI rendered back to JSON.
    pub fn json_abi(&self, account: &str) -> Result<String, RegistryError> {
        let entry = self.entry(account)?;
        AbiCodec::new(bootstrap::abi_def_abi())
            .bin_to_json("abi_def", &entry.bytes)
            .map(|v| v.to_string())
            .map_err(|source| RegistryError::InvalidAbi {
                name: account.into(),
                source,
            })
    }

    /// SHA-256 of the stored binary blob, as lowercase hex.
    pub fn hash_abi(&self, account: &str) -> Result<String, RegistryError> {
        self.entry(account)
            .map(|e| checksum::sha256_hex(&e.bytes))
    }

    /// Hashes for every stored ABI, keyed by account.
    pub fn hash_abis(&self) -> HashMap<String, String> {
        self.abis
            .iter()
            .map(|(account, e)| (account.clone(), checksum::sha256_hex(&e.bytes)))
            .collect()
    }

    /// Hex blobs for every stored ABI, keyed by account.
    pub fn hex_abis(&self) -> HashMap<String, String> {
        self.abis
            .iter()
            .map(|(account, e)| (account.clone(), hex::encode_upper(&e.bytes)))
            .collect()
    }

    fn entry(&self, account: &str) -> Result<&Entry, RegistryError> {
        self.abis
            .get(account)
            .ok_or_else(|| RegistryError::MissingAbi {
                name: account.into(),
            })
    }
}

/// Decode a binary ABI blob via the `abi_def` meta-ABI.
pub fn decode_abi(bytes: &[u8]) -> Result<AbiDef, SerializationError> {
    let codec = AbiCodec::new(bootstrap::abi_def_abi());
    let value = codec.bin_to_json("abi_def", bytes)?;
    Ok(serde_json::from_value(value)?)
}

/// Encode a JSON ABI to its canonical binary form. Sections absent from the
/// JSON are treated as empty.
pub fn encode_abi(json: &str) -> Result<Vec<u8>, SerializationError> {
    encode_abi_def(&AbiDef::from_json(json)?)
}

fn encode_abi_def(def: &AbiDef) -> Result<Vec<u8>, SerializationError> {
    let codec = AbiCodec::new(bootstrap::abi_def_abi());
    let value = serde_json::to_value(def)?;
    codec.json_to_bin("abi_def", &value)
}
