//! Sign-bytes and the signed transaction envelope.
//!
//! ```text
//! signable bytes:
//!   domain tag          b"sentinel-tx/v1" || 0x00
//!   chain id length     u32 big-endian
//!   chain id            UTF-8
//!   nonce               u64 big-endian
//!   request             JSON (field order fixed by the struct definition)
//! ```
//!
//! The envelope that goes on the wire is the JSON encoding of
//! [`SignedTransaction`]; the node recomputes the sign-bytes from it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{hex_bytes, PublicKeyBundle};
use crate::builder::TransactionRequest;
use crate::error::SentinelError;

/// Per-account replay counter.
pub type Nonce = u64;

const SIGN_DOMAIN: &[u8] = b"sentinel-tx/v1";

/// Deterministic bytes covered by the signature.
pub fn signable_bytes(
    chain_id: &str,
    nonce: Nonce,
    request: &TransactionRequest,
) -> Result<Vec<u8>, SentinelError> {
    let body = serde_json::to_vec(request)
        .map_err(|e| SentinelError::Encoding(format!("request serialization failed: {e}")))?;

    let chain_len = u32::try_from(chain_id.len())
        .map_err(|_| SentinelError::Encoding("chain id too long".into()))?;

    let mut out = Vec::with_capacity(SIGN_DOMAIN.len() + 1 + 4 + chain_id.len() + 8 + body.len());
    out.extend_from_slice(SIGN_DOMAIN);
    out.push(0x00);
    out.extend_from_slice(&chain_len.to_be_bytes());
    out.extend_from_slice(chain_id.as_bytes());
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// A request bound to a chain and nonce, with the signer's key and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub chain_id: String,
    pub nonce: Nonce,
    pub request: TransactionRequest,
    pub signer: PublicKeyBundle,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    /// Recomputes the bytes the signature must cover.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, SentinelError> {
        signable_bytes(&self.chain_id, self.nonce, &self.request)
    }

    /// Wire encoding posted to the node.
    pub fn encode(&self) -> Result<Vec<u8>, SentinelError> {
        serde_json::to_vec(self)
            .map_err(|e| SentinelError::Encoding(format!("transaction serialization failed: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SentinelError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SentinelError::Encoding(format!("transaction deserialization failed: {e}")))
    }

    /// SHA-256 of the wire encoding, upper-case hex (Tendermint convention).
    pub fn hash(&self) -> Result<String, SentinelError> {
        Ok(hex::encode_upper(Sha256::digest(self.encode()?)))
    }
}

/// Wire encoding of a signed transaction.
pub fn encode_signed(tx: &SignedTransaction) -> Result<Vec<u8>, SentinelError> {
    tx.encode()
}

pub fn decode_signed(bytes: &[u8]) -> Result<SignedTransaction, SentinelError> {
    SignedTransaction::decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Algorithm;
    use crate::amount::Amount;
    use crate::builder::{build, TransferFields};
    use crate::messages::{MessageKind, MessageParams, RegisterMasterNode};

    fn request() -> TransactionRequest {
        build(
            MessageKind::RegisterMasterNode,
            MessageParams::RegisterMasterNode(RegisterMasterNode {
                name: "master".into(),
                gas: 21000,
                password: "pw".into(),
            }),
            TransferFields {
                amount: Some(Amount::new("1", 0, "SNT")),
                ..TransferFields::default()
            },
        )
        .unwrap()
    }

    fn signed(nonce: Nonce) -> SignedTransaction {
        SignedTransaction {
            chain_id: "sentinel-testnet".into(),
            nonce,
            request: request(),
            signer: PublicKeyBundle::new(Algorithm::Ed25519, vec![4; 32]).unwrap(),
            signature: vec![0xAA; 64],
        }
    }

    #[test]
    fn signable_bytes_layout() {
        let bytes = signable_bytes("abc", 5, &request()).unwrap();
        assert!(bytes.starts_with(b"sentinel-tx/v1\0"));
        let rest = &bytes[SIGN_DOMAIN.len() + 1..];
        assert_eq!(&rest[..4], &3u32.to_be_bytes());
        assert_eq!(&rest[4..7], b"abc");
        assert_eq!(&rest[7..15], &5u64.to_be_bytes());
        assert_eq!(rest[15], b'{');
    }

    #[test]
    fn signable_bytes_bind_nonce_and_chain() {
        let r = request();
        let base = signable_bytes("chain-a", 1, &r).unwrap();
        assert_ne!(base, signable_bytes("chain-a", 2, &r).unwrap());
        assert_ne!(base, signable_bytes("chain-b", 1, &r).unwrap());
        assert_eq!(base, signable_bytes("chain-a", 1, &r).unwrap());
    }

    #[test]
    fn envelope_decodes_to_itself() {
        let tx = signed(5);
        let decoded = SignedTransaction::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(
            decoded.signable_bytes().unwrap(),
            signable_bytes("sentinel-testnet", 5, &tx.request).unwrap()
        );
    }

    #[test]
    fn hash_is_uppercase_sha256_hex() {
        let h = signed(1).hash().unwrap();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(h, signed(2).hash().unwrap());
    }

    #[test]
    fn wire_helpers_match_envelope_methods() {
        let tx = signed(3);
        let bytes = encode_signed(&tx).unwrap();
        assert_eq!(bytes, tx.encode().unwrap());
        assert_eq!(decode_signed(&bytes).unwrap(), tx);
        assert!(matches!(decode_signed(b"[]"), Err(SentinelError::Encoding(_))));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SignedTransaction::decode(b"not json"),
            Err(SentinelError::Encoding(_))
        ));
    }
}
