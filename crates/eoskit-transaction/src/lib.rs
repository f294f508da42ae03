//! Transaction building, signing, and broadcast for EOSIO-family chains.
//!
//! The [`Transaction`] type carries actions, TAPOS, and resource fields plus
//! an embedded ABI registry. External capabilities plug in at trait seams:
//! an RPC provider for chain state, a serialization provider for packing,
//! and a [`SignatureProvider`] for keys and signatures.
//!
//! ```no_run
//! # use eoskit_abi::AbiSerializer;
//! # use eoskit_core::Name;
//! # use eoskit_transaction::{Action, Authorization, Transaction};
//! # async fn example(rpc: &dyn eoskit_rpc::RpcProvider,
//! #     signer: &dyn eoskit_transaction::SignatureProvider,
//! #     token_abi_json: &str)
//! # -> Result<(), Box<dyn std::error::Error>> {
//! let mut transaction = Transaction::new();
//! transaction.add_action(Action::new(
//!     Name::new("eosio.token")?,
//!     Name::new("transfer")?,
//!     vec![Authorization::active(Name::new("todd")?)?],
//!     serde_json::json!({
//!         "from": "todd",
//!         "to": "brandon",
//!         "quantity": "42.0000 SYS",
//!         "memo": "",
//!     }),
//! ));
//! let serializer = AbiSerializer::new();
//! transaction.prepare(rpc).await?;
//! transaction.abis_mut().add_abi_json("eosio.token", token_abi_json)?;
//! transaction.serialize_action_data(&serializer)?;
//! let id = transaction.sign_and_broadcast(signer, rpc, &serializer).await?;
//! # Ok(())
//! # }
//! ```

mod abi_provider;
mod action;
mod error;
mod signature;
mod transaction;

pub use abi_provider::AbiProvider;
pub use action::{Action, Authorization};
pub use error::{AbiProviderError, SignatureProviderError, TransactionError};
pub use signature::{BinaryAbi, SignatureProvider, SignatureRequest, SignatureResponse};
pub use transaction::{Config, Extension, Transaction};
