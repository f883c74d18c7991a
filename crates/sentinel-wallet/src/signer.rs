//! Per-identity signing keys and transaction signing.

use chain_sentinel::{
    signable_bytes, Algorithm, Nonce, PublicKeyBundle, SignedTransaction, TransactionRequest,
};
use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::{Signer as _, Verifier as _};

use crate::error::WalletError;
use crate::hd_derivation::{derive_ed25519_key, derive_secp256k1_key};
use crate::types::Curve;
use crate::wallet::{Identity, Wallet};

/// Private key of one identity. Both variants wipe themselves on drop.
pub enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl SigningKey {
    /// Derive the key at `index` from a BIP-39 seed.
    pub fn derive(curve: Curve, seed: &[u8], index: u32) -> Result<Self, WalletError> {
        match curve {
            Curve::Ed25519 => Ok(SigningKey::Ed25519(derive_ed25519_key(seed, index)?.signing_key)),
            Curve::Secp256k1 => Ok(SigningKey::Secp256k1(
                derive_secp256k1_key(seed, index)?.signing_key,
            )),
        }
    }

    pub fn public_key(&self) -> Result<PublicKeyBundle, WalletError> {
        let bundle = match self {
            SigningKey::Ed25519(key) => PublicKeyBundle::new(
                Algorithm::Ed25519,
                key.verifying_key().to_bytes().to_vec(),
            ),
            SigningKey::Secp256k1(key) => PublicKeyBundle::new(
                Algorithm::Secp256k1,
                key.verifying_key().to_sec1_bytes().to_vec(),
            ),
        };
        bundle.map_err(|e| WalletError::DerivationFailed(e.to_string()))
    }

    /// Ed25519: 64-byte signature over `message`.
    /// Secp256k1: 64-byte `r || s` ECDSA signature over SHA-256(`message`).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            SigningKey::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            SigningKey::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.sign(message);
                signature.to_bytes().to_vec()
            }
        }
    }
}

/// Sign `request` for `chain_id` at `nonce` with `identity`'s key.
pub fn sign_request(
    wallet: &Wallet,
    identity: &Identity,
    chain_id: &str,
    nonce: Nonce,
    request: TransactionRequest,
) -> Result<SignedTransaction, WalletError> {
    let key = wallet.signing_key_for(identity)?;
    let message = signable_bytes(chain_id, nonce, &request)?;
    let signature = key.sign(&message);

    Ok(SignedTransaction {
        chain_id: chain_id.to_string(),
        nonce,
        request,
        signer: identity.pubkey().clone(),
        signature,
    })
}

/// Check a signed transaction's signature against its embedded signer key.
pub fn verify_signature(tx: &SignedTransaction) -> Result<(), WalletError> {
    let message = tx.signable_bytes()?;
    let invalid = |e: String| WalletError::SigningFailed(format!("signature check failed: {e}"));

    match tx.signer.algo {
        Algorithm::Ed25519 => {
            let key_bytes: [u8; 32] = tx
                .signer
                .data
                .as_slice()
                .try_into()
                .map_err(|_| invalid("bad ed25519 key length".into()))?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
                .map_err(|e| invalid(e.to_string()))?;
            let signature = ed25519_dalek::Signature::from_slice(&tx.signature)
                .map_err(|e| invalid(e.to_string()))?;
            key.verify(&message, &signature)
                .map_err(|e| invalid(e.to_string()))
        }
        Algorithm::Secp256k1 => {
            let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&tx.signer.data)
                .map_err(|e| invalid(e.to_string()))?;
            let signature = k256::ecdsa::Signature::from_slice(&tx.signature)
                .map_err(|e| invalid(e.to_string()))?;
            key.verify(&message, &signature)
                .map_err(|e| invalid(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use chain_sentinel::messages::RegisterMasterNode;
    use chain_sentinel::{build, MessageKind, MessageParams, TransferFields};

    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn request() -> TransactionRequest {
        build(
            MessageKind::RegisterMasterNode,
            MessageParams::RegisterMasterNode(RegisterMasterNode {
                name: "node-1".into(),
                gas: 200_000,
                password: "pw".into(),
            }),
            TransferFields::default(),
        )
        .unwrap()
    }

    fn signed_with(curve: Curve) -> SignedTransaction {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, curve, None).unwrap();
        let identity = wallet.derive_identity(0).unwrap();
        sign_request(&wallet, &identity, "sentinel-testnet", 7, request()).unwrap()
    }

    #[test]
    fn ed25519_signature_verifies() {
        let tx = signed_with(Curve::Ed25519);
        assert_eq!(tx.signature.len(), 64);
        assert_eq!(tx.nonce, 7);
        verify_signature(&tx).unwrap();
    }

    #[test]
    fn secp256k1_signature_verifies() {
        let tx = signed_with(Curve::Secp256k1);
        assert_eq!(tx.signature.len(), 64);
        assert_eq!(tx.signer.algo, Algorithm::Secp256k1);
        verify_signature(&tx).unwrap();
    }

    #[test]
    fn ed25519_signing_is_deterministic() {
        assert_eq!(
            signed_with(Curve::Ed25519).signature,
            signed_with(Curve::Ed25519).signature
        );
    }

    #[test]
    fn tampered_nonce_fails_verification() {
        let mut tx = signed_with(Curve::Ed25519);
        tx.nonce += 1;
        assert!(matches!(
            verify_signature(&tx),
            Err(WalletError::SigningFailed(_))
        ));
    }

    #[test]
    fn tampered_chain_id_fails_verification() {
        let mut tx = signed_with(Curve::Secp256k1);
        tx.chain_id = "another-chain".into();
        assert!(verify_signature(&tx).is_err());
    }

    #[test]
    fn foreign_identity_is_refused() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        wallet.derive_identity(0).unwrap();

        let mut other = Wallet::from_phrase(TEST_MNEMONIC, Curve::Secp256k1, None).unwrap();
        let foreign = other.derive_identity(0).unwrap();

        assert!(matches!(
            sign_request(&wallet, &foreign, "sentinel-testnet", 1, request()),
            Err(WalletError::UnknownIdentity(_))
        ));
    }
}
