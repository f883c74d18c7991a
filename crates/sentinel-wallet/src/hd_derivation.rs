use bip32::{DerivationPath, XPrv};
use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey;
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::WalletError;

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;

/// Purpose level of the simple-address Ed25519 path ("IOV" on a phone keypad).
pub const ED25519_PURPOSE: u32 = 4_804_438;

/// Cosmos coin type used for secp256k1 identities.
pub const SECP256K1_COIN_TYPE: u32 = 118;

/// Ed25519 path: m/4804438'/index'
pub fn ed25519_path(index: u32) -> String {
    format!("m/{ED25519_PURPOSE}'/{index}'")
}

/// Secp256k1 path: m/44'/118'/0'/0/index
pub fn secp256k1_path(index: u32) -> String {
    format!("m/44'/{SECP256K1_COIN_TYPE}'/0'/0/{index}")
}

fn check_index(index: u32) -> Result<(), WalletError> {
    if index & HARDENED != 0 {
        return Err(WalletError::DerivationFailed(format!(
            "identity index {index} out of range (max {})",
            HARDENED - 1
        )));
    }
    Ok(())
}

/// Derive a secp256k1 key from seed using BIP-32
pub fn derive_secp256k1_key(seed: &[u8], index: u32) -> Result<DerivedSecp256k1Key, WalletError> {
    check_index(index)?;
    let path_str = secp256k1_path(index);

    let path: DerivationPath = path_str
        .parse()
        .map_err(|e: bip32::Error| WalletError::DerivationFailed(e.to_string()))?;

    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    let mut private_key: [u8; 32] = xprv.to_bytes().into();
    let signing_key = SigningKey::from_bytes(&private_key.into())
        .map_err(|e| WalletError::DerivationFailed(e.to_string()));
    private_key.zeroize();
    let signing_key = signing_key?;

    let public_key: [u8; 33] = signing_key
        .verifying_key()
        .to_sec1_bytes()
        .as_ref()
        .try_into()
        .map_err(|_| WalletError::DerivationFailed("Invalid public key length".into()))?;

    Ok(DerivedSecp256k1Key {
        signing_key,
        public_key,
        derivation_path: path_str,
    })
}

/// Derive an Ed25519 key from seed along m/4804438'/index'.
pub fn derive_ed25519_key(seed: &[u8], index: u32) -> Result<DerivedEd25519Key, WalletError> {
    check_index(index)?;

    let mut private_key = slip10_ed25519(seed, &[ED25519_PURPOSE, index])?;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&private_key);
    private_key.zeroize();

    let public_key = signing_key.verifying_key().to_bytes();
    Ok(DerivedEd25519Key {
        signing_key,
        public_key,
        derivation_path: ed25519_path(index),
    })
}

/// SLIP-0010 Ed25519 derivation. Every level is hardened.
fn slip10_ed25519(seed: &[u8], path: &[u32]) -> Result<[u8; 32], WalletError> {
    // Master key: HMAC-SHA512(key="ed25519 seed", data=seed)
    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
    mac.update(seed);
    let mut result = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&result[..32]);
    chain_code.copy_from_slice(&result[32..]);
    result.as_mut_slice().zeroize();

    for child_index in path {
        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
        // Hardened child: 0x00 || key || index (with hardened bit set)
        mac.update(&[0x00]);
        mac.update(&key);
        mac.update(&(child_index | HARDENED).to_be_bytes());
        let mut result = mac.finalize().into_bytes();

        key.copy_from_slice(&result[..32]);
        chain_code.copy_from_slice(&result[32..]);
        result.as_mut_slice().zeroize();
    }

    chain_code.zeroize();
    Ok(key)
}

/// Derived secp256k1 key. `k256::ecdsa::SigningKey` wipes itself on drop.
pub struct DerivedSecp256k1Key {
    pub signing_key: SigningKey,
    pub public_key: [u8; 33],
    pub derivation_path: String,
}

/// Derived Ed25519 key. `ed25519_dalek::SigningKey` wipes itself on drop.
pub struct DerivedEd25519Key {
    pub signing_key: ed25519_dalek::SigningKey,
    pub public_key: [u8; 32],
    pub derivation_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mnemonic::phrase_to_seed;

    // BIP-39 test vector: "abandon" x11 + "about"
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_seed() -> Vec<u8> {
        phrase_to_seed(TEST_MNEMONIC, "").unwrap().to_vec()
    }

    #[test]
    fn test_slip10_vector_1() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(
            hex::encode(slip10_ed25519(&seed, &[]).unwrap()),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            hex::encode(slip10_ed25519(&seed, &[0]).unwrap()),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_derive_ed25519_key() {
        let key = derive_ed25519_key(&test_seed(), 0).unwrap();
        assert_eq!(key.derivation_path, "m/4804438'/0'");
        assert_eq!(key.public_key, key.signing_key.verifying_key().to_bytes());
    }

    #[test]
    fn test_derive_secp256k1_key() {
        let key = derive_secp256k1_key(&test_seed(), 0).unwrap();
        assert_eq!(key.derivation_path, "m/44'/118'/0'/0/0");
        // Compressed key should start with 02 or 03
        assert!(key.public_key[0] == 0x02 || key.public_key[0] == 0x03);
    }

    #[test]
    fn test_derivation_deterministic() {
        let seed = test_seed();
        let a = derive_ed25519_key(&seed, 3).unwrap();
        let b = derive_ed25519_key(&seed, 3).unwrap();
        assert_eq!(a.public_key, b.public_key);

        let a = derive_secp256k1_key(&seed, 3).unwrap();
        let b = derive_secp256k1_key(&seed, 3).unwrap();
        assert_eq!(a.public_key, b.public_key);
    }

    #[test]
    fn test_different_indexes_different_keys() {
        let seed = test_seed();
        assert_ne!(
            derive_ed25519_key(&seed, 0).unwrap().public_key,
            derive_ed25519_key(&seed, 1).unwrap().public_key
        );
        assert_ne!(
            derive_secp256k1_key(&seed, 0).unwrap().public_key,
            derive_secp256k1_key(&seed, 1).unwrap().public_key
        );
    }

    #[test]
    fn test_hardened_index_rejected() {
        let seed = test_seed();
        assert!(matches!(
            derive_ed25519_key(&seed, HARDENED),
            Err(WalletError::DerivationFailed(_))
        ));
        assert!(matches!(
            derive_secp256k1_key(&seed, u32::MAX),
            Err(WalletError::DerivationFailed(_))
        ));
    }
}
