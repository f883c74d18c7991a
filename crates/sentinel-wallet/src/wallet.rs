//! Wallets and the identities derived from them.

use chain_sentinel::{Address, PublicKeyBundle};
use crypto_utils::random::try_random_bytes_fixed;
use crypto_utils::{SecretBytes, SecretString};
use tracing::debug;

use crate::error::WalletError;
use crate::mnemonic::{normalize_phrase, phrase_to_seed};
use crate::signer::SigningKey;
use crate::types::{Curve, IdentityId, WalletId};

/// One derived keypair, addressed by its public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pubkey: PublicKeyBundle,
    index: u32,
    address: Address,
    label: Option<String>,
}

impl Identity {
    fn new(pubkey: PublicKeyBundle, index: u32, label: Option<String>) -> Self {
        let address = pubkey.address();
        Self {
            pubkey,
            index,
            address,
            label,
        }
    }

    pub fn id(&self) -> IdentityId {
        IdentityId::from_pubkey(&self.pubkey)
    }

    pub fn pubkey(&self) -> &PublicKeyBundle {
        &self.pubkey
    }

    /// Derivation index the identity was created at.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// A mnemonic-rooted HD wallet and the identities derived from it so far.
///
/// Identities keep the order they were derived in. Apart from labels,
/// nothing about an identity changes after derivation.
#[derive(Debug)]
pub struct Wallet {
    id: WalletId,
    label: Option<String>,
    curve: Curve,
    mnemonic: SecretString,
    identities: Vec<Identity>,
}

impl Wallet {
    /// Create a wallet from a 12 or 24 word phrase. No identity is derived yet.
    ///
    /// The same phrase used twice gives two wallets with distinct ids but
    /// identical keys.
    pub fn from_phrase(phrase: &str, curve: Curve, label: Option<String>) -> Result<Self, WalletError> {
        let mnemonic = normalize_phrase(phrase)?;
        let id = WalletId::new(hex::encode(try_random_bytes_fixed::<16>()?));
        Ok(Self {
            id,
            label,
            curve,
            mnemonic,
            identities: Vec::new(),
        })
    }

    /// Rebuild a stored wallet, re-deriving each identity and checking it
    /// against the stored public key.
    pub(crate) fn restore(
        id: WalletId,
        label: Option<String>,
        curve: Curve,
        phrase: &str,
        identities: Vec<(u32, PublicKeyBundle, Option<String>)>,
    ) -> Result<Self, WalletError> {
        let mut wallet = Self {
            id,
            label,
            curve,
            mnemonic: normalize_phrase(phrase)
                .map_err(|e| WalletError::CorruptStore(e.to_string()))?,
            identities: Vec::with_capacity(identities.len()),
        };

        let seed = wallet.seed()?;
        for (index, stored, label) in identities {
            if wallet.identities.iter().any(|i| i.index == index) {
                return Err(WalletError::CorruptStore(format!(
                    "wallet {} lists identity index {index} twice",
                    wallet.id
                )));
            }
            let derived = SigningKey::derive(curve, &seed, index)
                .and_then(|key| key.public_key())
                .map_err(|e| {
                    WalletError::CorruptStore(format!(
                        "identity {index} of wallet {}: {e}",
                        wallet.id
                    ))
                })?;
            if derived != stored {
                return Err(WalletError::CorruptStore(format!(
                    "identity {index} of wallet {} does not match its mnemonic",
                    wallet.id
                )));
            }
            wallet.identities.push(Identity::new(derived, index, label));
        }
        Ok(wallet)
    }

    pub fn id(&self) -> &WalletId {
        &self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub(crate) fn mnemonic(&self) -> &SecretString {
        &self.mnemonic
    }

    fn seed(&self) -> Result<SecretBytes, WalletError> {
        phrase_to_seed(self.mnemonic.expose(), "")
    }

    /// Derive the identity at `index`.
    ///
    /// Deriving an index that already exists returns that identity unchanged.
    pub fn derive_identity(&mut self, index: u32) -> Result<Identity, WalletError> {
        if let Some(existing) = self.identities.iter().find(|i| i.index == index) {
            return Ok(existing.clone());
        }

        let seed = self.seed()?;
        let pubkey = SigningKey::derive(self.curve, &seed, index)?.public_key()?;
        let identity = Identity::new(pubkey, index, None);

        debug!(wallet = %self.id, index, address = %identity.address, "derived identity");
        self.identities.push(identity.clone());
        Ok(identity)
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn identity(&self, id: &IdentityId) -> Option<&Identity> {
        self.identities.iter().find(|i| &i.id() == id)
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub fn set_identity_label(&mut self, id: &IdentityId, label: Option<String>) -> Result<(), WalletError> {
        let identity = self
            .identities
            .iter_mut()
            .find(|i| &i.id() == id)
            .ok_or_else(|| WalletError::UnknownIdentity(id.to_string()))?;
        identity.label = label;
        Ok(())
    }

    /// Private key of an identity that belongs to this wallet.
    pub fn signing_key_for(&self, identity: &Identity) -> Result<SigningKey, WalletError> {
        let own = self
            .identities
            .iter()
            .find(|i| i.pubkey == identity.pubkey)
            .ok_or_else(|| WalletError::UnknownIdentity(identity.id().to_string()))?;

        let seed = self.seed()?;
        let key = SigningKey::derive(self.curve, &seed, own.index)
            .map_err(|e| WalletError::SigningFailed(e.to_string()))?;
        if key.public_key()? != own.pubkey {
            return Err(WalletError::SigningFailed(
                "derived key does not match identity".into(),
            ));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn rejects_invalid_phrase() {
        assert!(matches!(
            Wallet::from_phrase("not a real phrase", Curve::Ed25519, None),
            Err(WalletError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn same_phrase_gives_distinct_wallets_with_same_keys() {
        let mut a = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        let mut b = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(
            a.derive_identity(0).unwrap().pubkey(),
            b.derive_identity(0).unwrap().pubkey()
        );
    }

    #[test]
    fn derive_identity_is_idempotent() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Secp256k1, None).unwrap();
        let first = wallet.derive_identity(2).unwrap();
        let second = wallet.derive_identity(2).unwrap();
        assert_eq!(first, second);
        assert_eq!(wallet.identities().len(), 1);
    }

    #[test]
    fn identities_keep_derivation_order() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        for index in [3, 0, 7] {
            wallet.derive_identity(index).unwrap();
        }
        let order: Vec<u32> = wallet.identities().iter().map(Identity::index).collect();
        assert_eq!(order, vec![3, 0, 7]);
    }

    #[test]
    fn curves_derive_different_addresses() {
        let mut ed = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        let mut secp = Wallet::from_phrase(TEST_MNEMONIC, Curve::Secp256k1, None).unwrap();
        let a = ed.derive_identity(0).unwrap();
        let b = secp.derive_identity(0).unwrap();
        assert_ne!(a.address(), b.address());
        assert!(a.address().to_string().starts_with("sent1"));
    }

    #[test]
    fn labels_are_metadata_only() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, Some("main".into())).unwrap();
        let identity = wallet.derive_identity(0).unwrap();

        wallet.set_label(None);
        assert_eq!(wallet.label(), None);

        wallet
            .set_identity_label(&identity.id(), Some("vpn payments".into()))
            .unwrap();
        let relabeled = wallet.identity(&identity.id()).unwrap();
        assert_eq!(relabeled.label(), Some("vpn payments"));
        assert_eq!(relabeled.pubkey(), identity.pubkey());
    }

    #[test]
    fn set_label_of_unknown_identity_fails() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        let mut other = Wallet::from_phrase(TEST_MNEMONIC, Curve::Secp256k1, None).unwrap();
        let foreign = other.derive_identity(0).unwrap();
        assert!(matches!(
            wallet.set_identity_label(&foreign.id(), None),
            Err(WalletError::UnknownIdentity(_))
        ));
    }

    #[test]
    fn restore_rejects_mismatched_pubkey() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        let identity = wallet.derive_identity(0).unwrap();

        let result = Wallet::restore(
            wallet.id().clone(),
            None,
            Curve::Ed25519,
            TEST_MNEMONIC,
            vec![(1, identity.pubkey().clone(), None)],
        );
        assert!(matches!(result, Err(WalletError::CorruptStore(_))));
    }

    #[test]
    fn restore_rejects_hardened_index() {
        let mut wallet = Wallet::from_phrase(TEST_MNEMONIC, Curve::Ed25519, None).unwrap();
        let identity = wallet.derive_identity(0).unwrap();

        let result = Wallet::restore(
            wallet.id().clone(),
            None,
            Curve::Ed25519,
            TEST_MNEMONIC,
            vec![(0x8000_0000, identity.pubkey().clone(), None)],
        );
        assert!(matches!(result, Err(WalletError::CorruptStore(_))));
    }
}
