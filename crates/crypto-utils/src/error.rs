use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("sealing failed: {0}")]
    SealFailed(String),

    /// The AEAD tag did not verify: wrong key, wrong associated data, or
    /// tampered ciphertext. The three cases are indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("key derivation failed: {0}")]
    KdfFailed(String),

    #[error("random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_seal_failed() {
        let err = CryptoError::SealFailed("aead seal error".into());
        assert_eq!(err.to_string(), "sealing failed: aead seal error");
    }

    #[test]
    fn display_authentication_failed_carries_no_detail() {
        let err = CryptoError::AuthenticationFailed;
        assert_eq!(err.to_string(), "authentication failed");
    }

    #[test]
    fn display_kdf_failed() {
        let err = CryptoError::KdfFailed("memory cost too low".into());
        assert_eq!(err.to_string(), "key derivation failed: memory cost too low");
    }

    #[test]
    fn display_entropy_unavailable() {
        let err = CryptoError::EntropyUnavailable("getrandom: ENOSYS".into());
        assert_eq!(err.to_string(), "random source unavailable: getrandom: ENOSYS");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(CryptoError::InvalidInput("short".into()));
        assert!(err.to_string().contains("short"));
    }
}
