//! # eoskit-core
//!
//! Shared primitives for the EosKit crates: validated chain names with their
//! 64-bit packed form, and checksum helpers used by the ABI registry and
//! provider layers.

pub mod checksum;
pub mod error;
pub mod name;

pub use error::NameError;
pub use name::Name;
