//! Error types for the ABI codec and registry.

use thiserror::Error;

/// Errors that can occur while converting between JSON and binary forms.
///
/// No partial output is ever returned: the first failure aborts the whole
/// encode or decode.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("ABI type not found: {type_name}")]
    TypeNotFound { type_name: String },

    #[error("No ABI action named '{action}' on contract '{contract}'")]
    ActionNotFound { contract: String, action: String },

    #[error("Cyclic type definition involving '{type_name}'")]
    CyclicType { type_name: String },

    #[error("Unknown variant alternative '{tag}' for variant '{variant}'")]
    UnknownVariantTag { variant: String, tag: String },

    #[error("Variant index {index} out of range for variant '{variant}' ({len} alternatives)")]
    VariantIndexOutOfRange {
        variant: String,
        index: u32,
        len: usize,
    },

    #[error("Missing field '{field}' encoding struct '{strct}'")]
    MissingField { strct: String, field: String },

    #[error("Type mismatch for '{type_name}': expected {expected}, got {got}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
        got: String,
    },

    #[error("Invalid value for '{type_name}': {reason}")]
    InvalidValue { type_name: String, reason: String },

    #[error("Invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("Unexpected end of input reading {what}")]
    Truncated { what: &'static str },

    #[error("Trailing bytes after decoding '{type_name}'")]
    TrailingBytes { type_name: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Cannot serialize action data: missing ABIs for accounts {accounts:?}")]
    MissingAbis { accounts: Vec<String> },
}

/// Errors from the ABI registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No ABI available for '{name}'")]
    MissingAbi { name: String },

    #[error("ABI for '{name}' failed validation: {source}")]
    InvalidAbi {
        name: String,
        #[source]
        source: SerializationError,
    },

    #[error("Invalid hex ABI payload: {reason}")]
    InvalidHex { reason: String },

    #[error("Invalid base64 ABI payload: {reason}")]
    InvalidBase64 { reason: String },
}

/// Errors from the public-key / signature text codec.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Unsupported key curve discriminant {discriminant}")]
    UnsupportedCurve { discriminant: u8 },

    #[error("Invalid {kind} string '{text}': {reason}")]
    InvalidText {
        kind: &'static str,
        text: String,
        reason: String,
    },

    #[error("Checksum mismatch in {kind} string '{text}'")]
    ChecksumMismatch { kind: &'static str, text: String },
}
