//! Sentinel wallet session.
//!
//! Recovery phrases, HD identities, the encrypted profile store, and a
//! [`WalletSession`] that signs and submits Sentinel transactions.

pub mod config;
pub mod error;
pub mod hd_derivation;
pub mod key_store;
pub mod mnemonic;
pub mod profile;
pub mod session;
pub mod signer;
pub mod types;
pub mod wallet;

pub use config::SessionConfig;
pub use error::WalletError;
pub use key_store::{KeyStore, KvStore, MemoryStore, SledStore};
pub use profile::Profile;
pub use session::{SubmissionResult, WalletSession};
pub use types::{Curve, IdentityId, WalletId, WordCount};
pub use wallet::{Identity, Wallet};
