//! # eoskit-abi
//!
//! The ABI-driven binary serialization engine for EosKit. Converts values
//! between their canonical JSON representation and the chain's compact binary
//! wire format, driven entirely by a loaded ABI definition.
//!
//! The crate defines:
//!
//! - [`AbiDef`] — the in-memory representation of a contract ABI
//! - [`AbiCodec`] — the table-driven JSON ↔ binary codec
//! - [`bootstrap`] — the hardcoded `abi_def` meta-ABI and protocol
//!   transaction ABI
//! - [`AbiRegistry`] — per-transaction storage of validated contract ABIs
//! - [`SerializationProvider`] — the capability trait the codec implements

pub mod bootstrap;
pub mod buffer;
pub mod codec;
pub mod def;
pub mod error;
pub mod keys;
pub mod provider;
pub mod registry;

pub use codec::AbiCodec;
pub use def::{AbiDef, ActionDef, FieldDef, StructDef, TableDef, TypeDef, VariantDef};
pub use error::{KeyError, RegistryError, SerializationError};
pub use provider::{AbiSerializer, SerializationProvider};
pub use registry::AbiRegistry;
