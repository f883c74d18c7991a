use std::path::Path;
use std::time::Duration;

use chain_sentinel::network::{SentinelNetwork, TESTNET};
use crypto_utils::KdfParams;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

pub const DEFAULT_STORE_NAME: &str = "sentinel-profile";

/// Settings of one wallet session. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key under which the encrypted profile is stored.
    pub store_name: String,
    pub kdf: KdfParams,
    /// Chain endpoint used by `connect_configured`.
    pub endpoint: String,
    pub expected_chain_id: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_network(&TESTNET)
    }
}

impl SessionConfig {
    pub fn for_network(network: &SentinelNetwork) -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            kdf: KdfParams::default(),
            endpoint: network.rpc_url.to_string(),
            expected_chain_id: network.chain_id.map(str::to_string),
            request_timeout_secs: network.request_timeout_secs,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WalletError::Validation(format!("invalid session config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Storage(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.store_name.trim().is_empty() {
            return Err(WalletError::Validation("store_name must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(WalletError::Validation(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_sentinel::network::LOCAL;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.store_name, "sentinel-profile");
        assert_eq!(config.kdf, KdfParams { m_cost: 65536, t_cost: 3, p_cost: 4 });
        assert_eq!(config.endpoint, "http://tm-testnet.sentinelgroup.io:26657/");
        assert_eq!(config.expected_chain_id, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = SessionConfig::from_json(
            r#"{ "endpoint": "http://10.0.0.5:26657/", "expected_chain_id": "sentinel-dev" }"#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "http://10.0.0.5:26657/");
        assert_eq!(config.expected_chain_id.as_deref(), Some("sentinel-dev"));
        assert_eq!(config.store_name, DEFAULT_STORE_NAME);
    }

    #[test]
    fn rejects_zero_timeout_and_blank_store() {
        assert!(matches!(
            SessionConfig::from_json(r#"{ "request_timeout_secs": 0 }"#),
            Err(WalletError::Validation(_))
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{ "store_name": "  " }"#),
            Err(WalletError::Validation(_))
        ));
    }

    #[test]
    fn rejects_ill_typed_json() {
        assert!(SessionConfig::from_json(r#"{ "request_timeout_secs": "soon" }"#).is_err());
    }

    #[test]
    fn for_local_network() {
        let config = SessionConfig::for_network(&LOCAL);
        assert_eq!(config.endpoint, "http://127.0.0.1:26657/");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{ "store_name": "alt" }"#).unwrap();
        assert_eq!(SessionConfig::from_file(&path).unwrap().store_name, "alt");
    }
}
