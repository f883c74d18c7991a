//! # crypto-utils
//!
//! Sealing, password key derivation, secure randomness, and zeroizing secret
//! wrappers shared by the Sentinel wallet crates.

pub mod encryption;
pub mod error;
pub mod kdf;
pub mod random;
pub mod secret;

pub use error::CryptoError;
pub use kdf::KdfParams;
pub use secret::{SecretBytes, SecretString};
