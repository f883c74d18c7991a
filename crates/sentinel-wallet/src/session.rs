//! The wallet session: one key store, at most one unlocked profile, and at
//! most one chain connection.

use std::sync::Arc;

use chain_sentinel::{
    encode_signed, Address, ChainConnection, Nonce, SentinelError, TransactionRequest,
};
use crypto_utils::SecretString;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::WalletError;
use crate::key_store::{KeyStore, KvStore};
use crate::mnemonic;
use crate::profile::Profile;
use crate::signer::sign_request;
use crate::types::{Curve, IdentityId, WalletId, WordCount};
use crate::wallet::{Identity, Wallet};

/// What the chain reported for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub chain_id: String,
    /// Nonce the transaction was signed with.
    pub nonce: Nonce,
    pub tx_hash: String,
    pub height: u64,
}

/// Caller-owned session state. Nothing here is process-global, so several
/// sessions can coexist (one per store name).
pub struct WalletSession {
    store: KeyStore,
    config: SessionConfig,
    profile: Option<Profile>,
    connection: Option<ChainConnection>,
}

impl WalletSession {
    pub fn new(backend: Arc<dyn KvStore>, config: SessionConfig) -> Self {
        let store = KeyStore::new(backend, config.store_name.clone(), config.kdf);
        Self {
            store,
            config,
            profile: None,
            connection: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    // ─── Profile lifecycle ───────────────────────────────────────────

    /// Create an empty profile, store it under `passphrase` and make it active.
    ///
    /// Refuses to overwrite a stored profile.
    pub async fn create_profile(&mut self, passphrase: &SecretString) -> Result<&Profile, WalletError> {
        if self.store.exists().await? {
            return Err(WalletError::Validation(format!(
                "a profile is already stored as {:?}",
                self.store.store_name()
            )));
        }
        let profile = Profile::new();
        self.store.save(&profile, passphrase).await?;
        info!(store = %self.store.store_name(), "profile created");
        Ok(&*self.profile.insert(profile))
    }

    /// Decrypt the stored profile and make it active.
    pub async fn unlock(&mut self, passphrase: &SecretString) -> Result<&Profile, WalletError> {
        let profile = self.store.load(passphrase).await?;
        Ok(&*self.profile.insert(profile))
    }

    /// Load the stored profile, or create one on first use.
    pub async fn open_or_create(&mut self, passphrase: &SecretString) -> Result<&Profile, WalletError> {
        if self.store.exists().await? {
            self.unlock(passphrase).await
        } else {
            self.create_profile(passphrase).await
        }
    }

    /// Drop the active profile from memory. The stored copy is untouched.
    pub fn lock(&mut self) {
        if self.profile.take().is_some() {
            debug!("profile locked");
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.profile.is_some()
    }

    /// Persist the active profile under `passphrase`.
    pub async fn save(&self, passphrase: &SecretString) -> Result<(), WalletError> {
        self.store.save(self.profile()?, passphrase).await
    }

    pub fn profile(&self) -> Result<&Profile, WalletError> {
        self.profile.as_ref().ok_or(WalletError::NoActiveProfile)
    }

    fn profile_mut(&mut self) -> Result<&mut Profile, WalletError> {
        self.profile.as_mut().ok_or(WalletError::NoActiveProfile)
    }

    fn wallet_mut(&mut self, wallet_id: &WalletId) -> Result<&mut Wallet, WalletError> {
        self.profile_mut()?
            .wallet_mut(wallet_id)
            .ok_or_else(|| WalletError::UnknownWallet(wallet_id.to_string()))
    }

    // ─── Wallets and identities ──────────────────────────────────────

    pub fn generate_phrase(&self, count: WordCount) -> Result<SecretString, WalletError> {
        mnemonic::generate_phrase(count)
    }

    /// Add a wallet derived from `phrase` to the active profile.
    pub fn create_wallet(
        &mut self,
        phrase: &SecretString,
        curve: Curve,
        label: Option<String>,
    ) -> Result<WalletId, WalletError> {
        let profile = self.profile_mut()?;
        let wallet = Wallet::from_phrase(phrase.expose(), curve, label)?;
        Ok(profile.add_wallet(wallet))
    }

    pub fn derive_identity(&mut self, wallet_id: &WalletId, index: u32) -> Result<Identity, WalletError> {
        self.wallet_mut(wallet_id)?.derive_identity(index)
    }

    pub fn set_wallet_label(&mut self, wallet_id: &WalletId, label: Option<String>) -> Result<(), WalletError> {
        self.wallet_mut(wallet_id)?.set_label(label);
        Ok(())
    }

    pub fn set_identity_label(
        &mut self,
        wallet_id: &WalletId,
        identity: &IdentityId,
        label: Option<String>,
    ) -> Result<(), WalletError> {
        self.wallet_mut(wallet_id)?.set_identity_label(identity, label)
    }

    // ─── Chain connection ────────────────────────────────────────────

    /// Bind the session to `endpoint`, replacing any previous connection.
    pub async fn connect(
        &mut self,
        endpoint: &str,
        expected_chain_id: Option<&str>,
    ) -> Result<&ChainConnection, WalletError> {
        let connection =
            ChainConnection::connect(endpoint, expected_chain_id, self.config.request_timeout()).await?;
        Ok(&*self.connection.insert(connection))
    }

    /// Connect to the endpoint named in the session config.
    pub async fn connect_configured(&mut self) -> Result<&ChainConnection, WalletError> {
        let endpoint = self.config.endpoint.clone();
        let expected = self.config.expected_chain_id.clone();
        self.connect(&endpoint, expected.as_deref()).await
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!(endpoint = connection.endpoint(), "disconnected");
        }
    }

    pub fn connection(&self) -> Result<&ChainConnection, WalletError> {
        self.connection.as_ref().ok_or(WalletError::NoActiveConnection)
    }

    pub async fn get_nonce(&self, address: &Address) -> Result<Nonce, WalletError> {
        Ok(self.connection()?.get_nonce(address).await?)
    }

    /// Sign `request` with `identity` from `wallet_id` and submit it.
    ///
    /// The nonce is read right before signing and embedded in the signed
    /// transaction. An account the chain has not seen yet starts at 0. A
    /// stale nonce surfaces as `RejectedByChain`; retrying is up to the
    /// caller.
    pub async fn sign_and_submit(
        &self,
        request: TransactionRequest,
        wallet_id: &WalletId,
        identity: &IdentityId,
    ) -> Result<SubmissionResult, WalletError> {
        let connection = self.connection()?;
        let wallet = self
            .profile()?
            .wallet(wallet_id)
            .ok_or_else(|| WalletError::UnknownWallet(wallet_id.to_string()))?;
        let signer = wallet
            .identity(identity)
            .ok_or_else(|| WalletError::UnknownIdentity(identity.to_string()))?;

        let nonce = match connection.get_nonce(signer.address()).await {
            Ok(nonce) => nonce,
            Err(SentinelError::NotFound(_)) => 0,
            Err(e) => return Err(e.into()),
        };

        let kind = request.kind;
        let signed = sign_request(wallet, signer, connection.chain_id(), nonce, request)?;
        let bytes = encode_signed(&signed)?;

        let response = connection.post_tx(&bytes).await.map_err(|e| {
            warn!(?kind, nonce, error = %e, "submission failed");
            WalletError::from(e)
        })?;

        info!(
            ?kind,
            nonce,
            chain_id = connection.chain_id(),
            hash = %response.hash,
            height = response.height,
            "transaction submitted"
        );
        Ok(SubmissionResult {
            chain_id: connection.chain_id().to_string(),
            nonce,
            tx_hash: response.hash,
            height: response.height,
        })
    }
}
