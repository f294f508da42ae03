//! ABI definition types — the in-memory representation of a contract ABI.
//!
//! Wire field names are snake_case; the layout mirrors the chain's `abi_def`
//! binary format (version, types, structs, actions, tables, ricardian
//! clauses, error messages, extensions, variants) and must stay bit-compatible
//! with existing chain nodes.

use serde::{Deserialize, Serialize};

/// A type alias: `new_type_name` resolves to `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A single field within a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A struct definition. `base` names a parent struct whose fields are
/// serialized first; an empty string terminates the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Maps an action name to the struct type that carries its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A ricardian clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClausePair {
    pub id: String,
    pub body: String,
}

/// A contract-declared error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error_code: u64,
    pub error_msg: String,
}

/// An opaque ABI extension entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiExtension {
    pub tag: u16,
    pub value: String,
}

/// A variant (tagged union) definition: the declared alternative type list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    pub types: Vec<String>,
}

/// A full contract ABI definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiDef {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub ricardian_clauses: Vec<ClausePair>,
    #[serde(default)]
    pub error_messages: Vec<ErrorMessage>,
    #[serde(default)]
    pub abi_extensions: Vec<AbiExtension>,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
}

impl AbiDef {
    /// Parse an ABI from its JSON text form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a struct definition by name.
    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Look up a variant definition by name.
    pub fn find_variant(&self, name: &str) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Look up a typedef target by alias name.
    pub fn find_typedef(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.new_type_name == name)
            .map(|t| t.type_name.as_str())
    }

    /// The data type for an action, if the ABI declares one.
    pub fn type_for_action(&self, action: &str) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.name == action)
            .map(|a| a.type_name.as_str())
    }

    /// The row type for a table, if the ABI declares one.
    pub fn type_for_table(&self, table: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.type_name.as_str())
    }
}
