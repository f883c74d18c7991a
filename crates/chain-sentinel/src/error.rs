use thiserror::Error;

/// Sentinel chain operation errors.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Malformed or missing transaction parameters. Never reaches the chain.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("endpoint unreachable: {0}")]
    UnreachableEndpoint(String),

    #[error("chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainIdMismatch { expected: String, actual: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected by chain (code {code}): {log}")]
    RejectedByChain { code: u32, log: String },

    #[error("network error: {0}")]
    Network(String),
}

impl SentinelError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        SentinelError::Validation(msg.into())
    }
}
