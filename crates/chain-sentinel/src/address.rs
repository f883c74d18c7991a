//! Sentinel account addresses.
//!
//! An address is the bech32 encoding (human-readable part `sent`) of a
//! 20-byte digest of the account's public key:
//!
//! - Ed25519: first 20 bytes of `SHA-256(pubkey)`
//! - Secp256k1: `RIPEMD-160(SHA-256(compressed pubkey))`

use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::SentinelError;

/// Human-readable part of every Sentinel address.
pub const ADDRESS_HRP: &str = "sent";

/// Length of the address payload in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Signature scheme of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Ed25519,
    Secp256k1,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "ed25519",
            Algorithm::Secp256k1 => "secp256k1",
        }
    }

    /// Expected public key length in bytes (secp256k1 keys are compressed).
    pub fn public_key_len(&self) -> usize {
        match self {
            Algorithm::Ed25519 => 32,
            Algorithm::Secp256k1 => 33,
        }
    }
}

/// A public key tagged with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyBundle {
    pub algo: Algorithm,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl PublicKeyBundle {
    pub fn new(algo: Algorithm, data: Vec<u8>) -> Result<Self, SentinelError> {
        if data.len() != algo.public_key_len() {
            return Err(SentinelError::Encoding(format!(
                "{} public key must be {} bytes, got {}",
                algo.as_str(),
                algo.public_key_len(),
                data.len()
            )));
        }
        Ok(Self { algo, data })
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Address {
        let sha = Sha256::digest(&self.data);
        let mut bytes = [0u8; ADDRESS_LEN];
        match self.algo {
            Algorithm::Ed25519 => bytes.copy_from_slice(&sha[..ADDRESS_LEN]),
            Algorithm::Secp256k1 => bytes.copy_from_slice(&Ripemd160::digest(sha)),
        }
        Address(bytes)
    }
}

/// A validated 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parses a bech32 address, checking checksum, prefix and payload length.
    pub fn parse(s: &str) -> Result<Self, SentinelError> {
        let (hrp, data, variant) = bech32::decode(s)
            .map_err(|e| SentinelError::InvalidAddress(format!("bech32 decode failed: {e}")))?;

        if hrp != ADDRESS_HRP {
            return Err(SentinelError::InvalidAddress(format!(
                "expected prefix {ADDRESS_HRP:?}, got {hrp:?}"
            )));
        }
        if variant != Variant::Bech32 {
            return Err(SentinelError::InvalidAddress("expected bech32, got bech32m".into()));
        }

        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| SentinelError::InvalidAddress(format!("base32 conversion failed: {e}")))?;

        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            SentinelError::InvalidAddress(format!("expected {ADDRESS_LEN} bytes, got {}", v.len()))
        })?;

        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The HRP is a valid constant and the payload is fixed-size, so
        // encoding can only fail on a bech32 length limit we never reach.
        match bech32::encode(ADDRESS_HRP, self.0.to_base32(), Variant::Bech32) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Hex (de)serialization for byte vectors.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
