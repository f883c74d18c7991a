use chain_sentinel::SentinelError;
use crypto_utils::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Malformed or missing transaction parameters. Never submitted.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Wrong passphrase")]
    WrongPassphrase,

    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unreachable endpoint: {0}")]
    UnreachableEndpoint(String),

    #[error("Chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainIdMismatch { expected: String, actual: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Rejected by chain (code {code}): {log}")]
    RejectedByChain { code: u32, log: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Insufficient entropy: {0}")]
    InsufficientEntropy(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("No active profile")]
    NoActiveProfile,

    #[error("No active connection")]
    NoActiveConnection,

    #[error("Unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WalletError {
    /// Whether resubmitting with a freshly read nonce can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::RejectedByChain { .. } | WalletError::NetworkError(_)
        )
    }
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => WalletError::WrongPassphrase,
            CryptoError::EntropyUnavailable(msg) => WalletError::InsufficientEntropy(msg),
            CryptoError::InvalidInput(msg) => WalletError::CorruptStore(msg),
            CryptoError::SealFailed(msg) | CryptoError::KdfFailed(msg) => {
                WalletError::Storage(msg)
            }
        }
    }
}

impl From<SentinelError> for WalletError {
    fn from(e: SentinelError) -> Self {
        match e {
            SentinelError::Validation(msg) | SentinelError::InvalidAddress(msg) => {
                WalletError::Validation(msg)
            }
            SentinelError::Encoding(msg) => WalletError::SigningFailed(msg),
            SentinelError::UnreachableEndpoint(msg) => WalletError::UnreachableEndpoint(msg),
            SentinelError::ChainIdMismatch { expected, actual } => {
                WalletError::ChainIdMismatch { expected, actual }
            }
            SentinelError::NotFound(msg) => WalletError::NotFound(msg),
            SentinelError::RejectedByChain { code, log } => {
                WalletError::RejectedByChain { code, log }
            }
            SentinelError::Network(msg) => WalletError::NetworkError(msg),
        }
    }
}
