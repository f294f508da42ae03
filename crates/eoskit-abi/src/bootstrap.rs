//! Built-in ABIs that exist before any contract ABI is fetched.
//!
//! `abi_def_abi()` describes the ABI format itself, which lets the codec
//! decode the raw ABI blobs returned by `get_raw_abi`. `transaction_abi()`
//! describes the protocol-level transaction envelope (headers, actions,
//! extensions) used when packing a transaction for signing or broadcast.

use crate::def::AbiDef;
use std::sync::OnceLock;

const ABI_DEF_ABI_JSON: &str = r#"{
    "version": "eosio::abi/1.1",
    "structs": [
        {
            "name": "extensions_entry",
            "base": "",
            "fields": [
                {"name": "tag", "type": "uint16"},
                {"name": "value", "type": "bytes"}
            ]
        },
        {
            "name": "type_def",
            "base": "",
            "fields": [
                {"name": "new_type_name", "type": "string"},
                {"name": "type", "type": "string"}
            ]
        },
        {
            "name": "field_def",
            "base": "",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "type", "type": "string"}
            ]
        },
        {
            "name": "struct_def",
            "base": "",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "base", "type": "string"},
                {"name": "fields", "type": "field_def[]"}
            ]
        },
        {
            "name": "action_def",
            "base": "",
            "fields": [
                {"name": "name", "type": "name"},
                {"name": "type", "type": "string"},
                {"name": "ricardian_contract", "type": "string"}
            ]
        },
        {
            "name": "table_def",
            "base": "",
            "fields": [
                {"name": "name", "type": "name"},
                {"name": "index_type", "type": "string"},
                {"name": "key_names", "type": "string[]"},
                {"name": "key_types", "type": "string[]"},
                {"name": "type", "type": "string"}
            ]
        },
        {
            "name": "clause_pair",
            "base": "",
            "fields": [
                {"name": "id", "type": "string"},
                {"name": "body", "type": "string"}
            ]
        },
        {
            "name": "error_message",
            "base": "",
            "fields": [
                {"name": "error_code", "type": "uint64"},
                {"name": "error_msg", "type": "string"}
            ]
        },
        {
            "name": "variant_def",
            "base": "",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "types", "type": "string[]"}
            ]
        },
        {
            "name": "abi_def",
            "base": "",
            "fields": [
                {"name": "version", "type": "string"},
                {"name": "types", "type": "type_def[]"},
                {"name": "structs", "type": "struct_def[]"},
                {"name": "actions", "type": "action_def[]"},
                {"name": "tables", "type": "table_def[]"},
                {"name": "ricardian_clauses", "type": "clause_pair[]"},
                {"name": "error_messages", "type": "error_message[]"},
                {"name": "abi_extensions", "type": "extensions_entry[]"},
                {"name": "variants", "type": "variant_def[]$"}
            ]
        }
    ]
}"#;

const TRANSACTION_ABI_JSON: &str = r#"{
    "version": "eosio::abi/1.1",
    "types": [
        {"new_type_name": "account_name", "type": "name"},
        {"new_type_name": "action_name", "type": "name"},
        {"new_type_name": "permission_name", "type": "name"}
    ],
    "structs": [
        {
            "name": "permission_level",
            "base": "",
            "fields": [
                {"name": "actor", "type": "account_name"},
                {"name": "permission", "type": "permission_name"}
            ]
        },
        {
            "name": "action",
            "base": "",
            "fields": [
                {"name": "account", "type": "account_name"},
                {"name": "name", "type": "action_name"},
                {"name": "authorization", "type": "permission_level[]"},
                {"name": "data", "type": "bytes"}
            ]
        },
        {
            "name": "extension",
            "base": "",
            "fields": [
                {"name": "type", "type": "uint16"},
                {"name": "data", "type": "bytes"}
            ]
        },
        {
            "name": "transaction_header",
            "base": "",
            "fields": [
                {"name": "expiration", "type": "time_point_sec"},
                {"name": "ref_block_num", "type": "uint16"},
                {"name": "ref_block_prefix", "type": "uint32"},
                {"name": "max_net_usage_words", "type": "varuint32"},
                {"name": "max_cpu_usage_ms", "type": "uint8"},
                {"name": "delay_sec", "type": "varuint32"}
            ]
        },
        {
            "name": "transaction",
            "base": "transaction_header",
            "fields": [
                {"name": "context_free_actions", "type": "action[]"},
                {"name": "actions", "type": "action[]"},
                {"name": "transaction_extensions", "type": "extension[]"}
            ]
        }
    ]
}"#;

/// The meta-ABI describing the `abi_def` binary format itself.
pub fn abi_def_abi() -> &'static AbiDef {
    static ABI: OnceLock<AbiDef> = OnceLock::new();
    ABI.get_or_init(|| AbiDef::from_json(ABI_DEF_ABI_JSON).expect("built-in abi_def ABI is valid"))
}

/// The protocol-level transaction ABI.
pub fn transaction_abi() -> &'static AbiDef {
    static ABI: OnceLock<AbiDef> = OnceLock::new();
    ABI.get_or_init(|| {
        AbiDef::from_json(TRANSACTION_ABI_JSON).expect("built-in transaction ABI is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_def_abi_parses() {
        let abi = abi_def_abi();
        let root = abi.find_struct("abi_def").unwrap();
        assert_eq!(root.fields.len(), 9);
        assert_eq!(root.fields.last().unwrap().type_name, "variant_def[]$");
    }

    #[test]
    fn transaction_abi_parses() {
        let abi = transaction_abi();
        let trx = abi.find_struct("transaction").unwrap();
        assert_eq!(trx.base, "transaction_header");
        assert_eq!(abi.find_typedef("account_name"), Some("name"));
    }
}
