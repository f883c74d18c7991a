use std::fmt;

use chain_sentinel::{Algorithm, PublicKeyBundle};
use serde::{Deserialize, Serialize};

/// Signature scheme a wallet derives its identities with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Ed25519,
    Secp256k1,
}

impl Curve {
    /// Keyring implementation id of wallets on this curve.
    pub fn implementation_id(&self) -> &'static str {
        match self {
            Curve::Ed25519 => "ed25519-hd",
            Curve::Secp256k1 => "secp256k1-hd",
        }
    }

    pub fn from_implementation_id(id: &str) -> Option<Self> {
        match id {
            "ed25519-hd" => Some(Curve::Ed25519),
            "secp256k1-hd" => Some(Curve::Secp256k1),
            _ => None,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Curve::Ed25519 => Algorithm::Ed25519,
            Curve::Secp256k1 => Algorithm::Secp256k1,
        }
    }
}

/// Length of a recovery phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    pub fn words(&self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    /// Entropy bytes behind a phrase of this length (16 or 32).
    pub fn entropy_len(&self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }
}

/// Random per-wallet identifier, 16 bytes hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<algo>|<hex pubkey>`; stable across save and load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn from_pubkey(pubkey: &PublicKeyBundle) -> Self {
        Self(format!("{}|{}", pubkey.algo.as_str(), hex::encode(&pubkey.data)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implementation_ids() {
        for curve in [Curve::Ed25519, Curve::Secp256k1] {
            assert_eq!(Curve::from_implementation_id(curve.implementation_id()), Some(curve));
        }
        assert_eq!(Curve::from_implementation_id("ledger-hd"), None);
    }

    #[test]
    fn word_count_entropy() {
        assert_eq!(WordCount::Twelve.entropy_len(), 16);
        assert_eq!(WordCount::TwentyFour.entropy_len(), 32);
        assert_eq!(WordCount::TwentyFour.words(), 24);
    }

    #[test]
    fn identity_id_format() {
        let pubkey = PublicKeyBundle::new(Algorithm::Ed25519, vec![0xAB; 32]).unwrap();
        let id = IdentityId::from_pubkey(&pubkey);
        assert!(id.as_str().starts_with("ed25519|abab"));
        assert_eq!(id.as_str().len(), "ed25519|".len() + 64);
    }
}
