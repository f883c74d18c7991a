//! The profile: every wallet a user holds, and its keyring serialization.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "wallets": [
//!     { "implementation_id": "ed25519-hd",
//!       "data": { "id": "...", "label": null, "secret": "<phrase>",
//!                 "identities": [{ "index": 0, "pubkey": {...}, "label": null }] } }
//!   ]
//! }
//! ```

use chain_sentinel::PublicKeyBundle;
use crypto_utils::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::types::{Curve, IdentityId, WalletId};
use crate::wallet::{Identity, Wallet};

pub const KEYRING_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct KeyringDocument {
    format_version: u32,
    wallets: Vec<WalletEntry>,
}

#[derive(Serialize, Deserialize)]
struct WalletEntry {
    implementation_id: String,
    data: WalletData,
}

#[derive(Serialize, Deserialize)]
struct WalletData {
    id: WalletId,
    label: Option<String>,
    secret: String,
    identities: Vec<IdentityData>,
}

impl Drop for WalletData {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

#[derive(Serialize, Deserialize)]
struct IdentityData {
    index: u32,
    pubkey: PublicKeyBundle,
    label: Option<String>,
}

/// Container for a user's wallets. At most one is active per session.
#[derive(Debug, Default)]
pub struct Profile {
    wallets: Vec<Wallet>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_wallet(&mut self, wallet: Wallet) -> WalletId {
        let id = wallet.id().clone();
        info!(wallet = %id, curve = wallet.curve().implementation_id(), "wallet added");
        self.wallets.push(wallet);
        id
    }

    pub fn wallet(&self, id: &WalletId) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id() == id)
    }

    pub fn wallet_mut(&mut self, id: &WalletId) -> Option<&mut Wallet> {
        self.wallets.iter_mut().find(|w| w.id() == id)
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Locate an identity in any wallet.
    pub fn find_identity(&self, id: &IdentityId) -> Option<(&Wallet, &Identity)> {
        self.wallets
            .iter()
            .find_map(|w| w.identity(id).map(|identity| (w, identity)))
    }

    /// Keyring document, including every wallet's mnemonic.
    pub fn serialize(&self) -> Result<SecretString, WalletError> {
        let document = KeyringDocument {
            format_version: KEYRING_FORMAT_VERSION,
            wallets: self
                .wallets
                .iter()
                .map(|wallet| WalletEntry {
                    implementation_id: wallet.curve().implementation_id().to_string(),
                    data: WalletData {
                        id: wallet.id().clone(),
                        label: wallet.label().map(str::to_string),
                        secret: wallet.mnemonic().expose().to_string(),
                        identities: wallet
                            .identities()
                            .iter()
                            .map(|identity| IdentityData {
                                index: identity.index(),
                                pubkey: identity.pubkey().clone(),
                                label: identity.label().map(str::to_string),
                            })
                            .collect(),
                    },
                })
                .collect(),
        };

        serde_json::to_string(&document)
            .map(SecretString::new)
            .map_err(|e| WalletError::Storage(format!("keyring serialization failed: {e}")))
    }

    /// Parse a keyring document, re-deriving and checking every identity.
    pub fn deserialize(document: &str) -> Result<Self, WalletError> {
        let document: KeyringDocument = serde_json::from_str(document)
            .map_err(|e| WalletError::CorruptStore(format!("malformed keyring: {e}")))?;

        if document.format_version != KEYRING_FORMAT_VERSION {
            return Err(WalletError::CorruptStore(format!(
                "unsupported keyring format version {}",
                document.format_version
            )));
        }

        let mut profile = Profile::new();
        for mut entry in document.wallets {
            let curve = Curve::from_implementation_id(&entry.implementation_id).ok_or_else(|| {
                WalletError::CorruptStore(format!(
                    "unknown wallet implementation {:?}",
                    entry.implementation_id
                ))
            })?;
            if profile.wallet(&entry.data.id).is_some() {
                return Err(WalletError::CorruptStore(format!(
                    "duplicate wallet id {}",
                    entry.data.id
                )));
            }

            let identities = entry
                .data
                .identities
                .drain(..)
                .map(|i| (i.index, i.pubkey, i.label))
                .collect();
            let wallet = Wallet::restore(
                entry.data.id.clone(),
                entry.data.label.take(),
                curve,
                &entry.data.secret,
                identities,
            )?;
            profile.wallets.push(wallet);
        }
        Ok(profile)
    }
}
