use std::time::Duration;

use serde::Serialize;

/// A Sentinel network the wallet knows how to reach.
#[derive(Debug, Clone, Serialize)]
pub struct SentinelNetwork {
    pub name: &'static str,
    /// Tendermint JSON-RPC endpoint.
    pub rpc_url: &'static str,
    /// Chain id the endpoint must report, when it is pinned.
    pub chain_id: Option<&'static str>,
    pub token_ticker: &'static str,
    pub fractional_digits: u8,
    pub request_timeout_secs: u64,
    pub is_testnet: bool,
}

impl SentinelNetwork {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Public Sentinel Tendermint testnet.
pub const TESTNET: SentinelNetwork = SentinelNetwork {
    name: "testnet",
    rpc_url: "http://tm-testnet.sentinelgroup.io:26657/",
    chain_id: None,
    token_ticker: "SNT",
    fractional_digits: 8,
    request_timeout_secs: 30,
    is_testnet: true,
};

/// A node running on the local machine with default Tendermint ports.
pub const LOCAL: SentinelNetwork = SentinelNetwork {
    name: "local",
    rpc_url: "http://127.0.0.1:26657/",
    chain_id: None,
    token_ticker: "SNT",
    fractional_digits: 8,
    request_timeout_secs: 10,
    is_testnet: true,
};

/// Looks up a network by its short name.
pub fn get_network(name: &str) -> Option<&'static SentinelNetwork> {
    supported_networks().iter().copied().find(|n| n.name == name)
}

static NETWORKS: [&SentinelNetwork; 2] = [&TESTNET, &LOCAL];

pub fn supported_networks() -> &'static [&'static SentinelNetwork] {
    &NETWORKS
}
