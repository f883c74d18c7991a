//! Encrypted persistence of the profile.
//!
//! The profile's keyring document is sealed with AES-256-GCM under an
//! Argon2id key and written as one JSON envelope under a fixed store name:
//!
//! ```json
//! { "format_version": 1, "kdf": { "m_cost": 65536, "t_cost": 3, "p_cost": 4 },
//!   "salt": "<hex>", "ciphertext": "<hex: nonce || ciphertext || tag>" }
//! ```
//!
//! The associated data binds the ciphertext to the format version and the
//! store name, so an envelope copied under another name does not open.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use crypto_utils::{encryption, kdf, CryptoError, KdfParams, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::profile::Profile;

pub const STORE_FORMAT_VERSION: u32 = 1;

/// Minimal async key-value interface the key store writes through.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, WalletError>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), WalletError>;
    async fn delete(&self, key: &str) -> Result<(), WalletError>;
}

/// Process-local backend, lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, WalletError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), WalletError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), WalletError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// On-disk backend on a sled database.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let db = sled::open(path).map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(Self { db })
    }
}

fn storage(e: sled::Error) -> WalletError {
    WalletError::Storage(e.to_string())
}

#[async_trait]
impl KvStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, WalletError> {
        Ok(self.db.get(key).map_err(storage)?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), WalletError> {
        self.db.insert(key, value).map_err(storage)?;
        self.db.flush_async().await.map_err(storage)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), WalletError> {
        self.db.remove(key).map_err(storage)?;
        self.db.flush_async().await.map_err(storage)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    kdf: KdfParams,
    salt: String,
    ciphertext: String,
}

/// Passphrase-protected storage of one [`Profile`].
///
/// No writer coordination: callers keep a single active session per store.
#[derive(Clone)]
pub struct KeyStore {
    backend: Arc<dyn KvStore>,
    store_name: String,
    kdf: KdfParams,
}

impl KeyStore {
    pub fn new(backend: Arc<dyn KvStore>, store_name: impl Into<String>, kdf: KdfParams) -> Self {
        Self {
            backend,
            store_name: store_name.into(),
            kdf,
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    fn aad(&self, format_version: u32) -> Vec<u8> {
        format!("sentinel-keystore/v{format_version}/{}", self.store_name).into_bytes()
    }

    pub async fn exists(&self) -> Result<bool, WalletError> {
        Ok(self.backend.get(&self.store_name).await?.is_some())
    }

    /// Decrypt and parse the stored profile.
    ///
    /// `WrongPassphrase` when the key does not open the record; nothing
    /// partially decrypted is ever returned.
    pub async fn load(&self, passphrase: &SecretString) -> Result<Profile, WalletError> {
        let raw = self
            .backend
            .get(&self.store_name)
            .await?
            .ok_or_else(|| WalletError::NotFound(format!("no profile stored as {:?}", self.store_name)))?;

        let envelope: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| WalletError::CorruptStore(format!("malformed envelope: {e}")))?;
        if envelope.format_version != STORE_FORMAT_VERSION {
            return Err(WalletError::CorruptStore(format!(
                "unsupported store format version {}",
                envelope.format_version
            )));
        }

        envelope
            .kdf
            .check_bounds()
            .map_err(|e| WalletError::CorruptStore(e.to_string()))?;

        let salt: [u8; 16] = hex::decode(&envelope.salt)
            .ok()
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| WalletError::CorruptStore("salt must be 16 hex-encoded bytes".into()))?;
        let sealed = hex::decode(&envelope.ciphertext)
            .map_err(|e| WalletError::CorruptStore(format!("ciphertext is not hex: {e}")))?;

        let mut key = derive_key(passphrase, salt, envelope.kdf)
            .await
            .map_err(|e| match e {
                WalletError::Storage(msg) => WalletError::CorruptStore(msg),
                other => other,
            })?;
        let opened = encryption::open(&sealed, &key, &self.aad(envelope.format_version));
        key.zeroize();

        let plaintext = match opened {
            Ok(p) => p,
            Err(CryptoError::AuthenticationFailed) => {
                warn!(store = %self.store_name, "profile did not decrypt");
                return Err(WalletError::WrongPassphrase);
            }
            Err(e) => return Err(WalletError::CorruptStore(e.to_string())),
        };

        let document = String::from_utf8(plaintext)
            .map(SecretString::new)
            .map_err(|_| WalletError::CorruptStore("profile is not UTF-8".into()))?;
        let profile = Profile::deserialize(document.expose())?;

        info!(store = %self.store_name, wallets = profile.wallets().len(), "profile loaded");
        Ok(profile)
    }

    /// Seal `profile` under `passphrase`, replacing any stored record.
    pub async fn save(&self, profile: &Profile, passphrase: &SecretString) -> Result<(), WalletError> {
        let document = profile.serialize()?;
        let salt = kdf::generate_salt()?;

        let mut key = derive_key(passphrase, salt, self.kdf).await?;
        let sealed = encryption::seal(
            document.expose().as_bytes(),
            &key,
            &self.aad(STORE_FORMAT_VERSION),
        );
        key.zeroize();

        let envelope = Envelope {
            format_version: STORE_FORMAT_VERSION,
            kdf: self.kdf,
            salt: hex::encode(salt),
            ciphertext: hex::encode(sealed?),
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| WalletError::Storage(format!("envelope serialization failed: {e}")))?;

        self.backend.put(&self.store_name, bytes).await?;
        info!(store = %self.store_name, wallets = profile.wallets().len(), "profile saved");
        Ok(())
    }

    /// Remove the stored record. Deleting a missing record succeeds.
    pub async fn delete(&self) -> Result<(), WalletError> {
        self.backend.delete(&self.store_name).await?;
        debug!(store = %self.store_name, "profile deleted");
        Ok(())
    }
}

/// Argon2id runs on the blocking pool; it is deliberately slow.
async fn derive_key(
    passphrase: &SecretString,
    salt: [u8; 16],
    params: KdfParams,
) -> Result<[u8; 32], WalletError> {
    let passphrase = passphrase.clone();
    tokio::task::spawn_blocking(move || kdf::derive_key(passphrase.expose().as_bytes(), &salt, &params))
        .await
        .map_err(|e| WalletError::Storage(format!("key derivation task failed: {e}")))?
        .map_err(WalletError::from)
}
