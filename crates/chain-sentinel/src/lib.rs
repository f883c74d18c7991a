//! Sentinel chain support for the wallet.
//!
//! This crate provides:
//! - Token amounts and bech32 account addresses
//! - The closed set of Sentinel message payloads and their validation
//! - The pure transaction request builder
//! - Deterministic sign-bytes and the signed transaction envelope
//! - Network definitions and a JSON-RPC connection to a Tendermint node

pub mod address;
pub mod amount;
pub mod builder;
pub mod codec;
pub mod error;
pub mod messages;
pub mod network;
pub mod rpc;

pub use address::{Address, Algorithm, PublicKeyBundle};
pub use amount::Amount;
pub use builder::{build, build_from_json, TransactionRequest, TransferFields};
pub use codec::{decode_signed, encode_signed, signable_bytes, Nonce, SignedTransaction};
pub use error::SentinelError;
pub use messages::{MessageKind, MessageParams, SentSession};
pub use network::SentinelNetwork;
pub use rpc::{ChainConnection, PostTxResponse};
