//! JSON-RPC connection to a Sentinel Tendermint node.
//!
//! One [`ChainConnection`] is bound to one endpoint and the chain id that
//! endpoint reported when the connection was established. Every call is a
//! single HTTP round trip; there is no internal retry or locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::codec::Nonce;
use crate::error::SentinelError;

const JSONRPC_VERSION: &str = "2.0";

/// ABCI query path under which the node stores account nonces.
pub const NONCE_QUERY_PATH: &str = "/nonce";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct NodeInfo {
    network: String,
}

#[derive(Deserialize)]
struct SyncInfo {
    #[serde(deserialize_with = "u64_from_string_or_number")]
    latest_block_height: u64,
}

#[derive(Deserialize)]
struct AbciQueryResult {
    response: AbciQueryResponse,
}

#[derive(Deserialize)]
struct AbciQueryResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
}

#[derive(Deserialize)]
struct BroadcastCommitResult {
    check_tx: TxResult,
    deliver_tx: TxResult,
    hash: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    height: u64,
}

/// Tendermint encodes 64-bit integers as JSON strings; accept both forms.
fn u64_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("expected unsigned integer")),
        other => Err(serde::de::Error::custom(format!("expected integer, got {other}"))),
    }
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTxResponse {
    /// Transaction hash as reported by the node (upper-case hex).
    pub hash: String,
    /// Height of the block that included the transaction.
    pub height: u64,
    pub log: String,
}

/// Failure of a single JSON-RPC call, before it is mapped to the caller's
/// error vocabulary.
enum CallError {
    Transport(String),
    Rpc { code: i64, message: String },
    Decode(String),
}

impl CallError {
    fn describe(self) -> String {
        match self {
            CallError::Transport(msg) | CallError::Decode(msg) => msg,
            CallError::Rpc { code, message } => format!("rpc error {code}: {message}"),
        }
    }

    fn into_network(self) -> SentinelError {
        SentinelError::Network(self.describe())
    }
}

/// A live binding to one Sentinel node.
pub struct ChainConnection {
    client: reqwest::Client,
    url: Url,
    chain_id: String,
    request_id: AtomicU64,
}

impl ChainConnection {
    /// Connects to `endpoint` and reads its chain id.
    ///
    /// Fails with `UnreachableEndpoint` when the node cannot be queried and
    /// with `ChainIdMismatch` when it reports a chain other than
    /// `expected_chain_id`.
    pub async fn connect(
        endpoint: &str,
        expected_chain_id: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, SentinelError> {
        let url = Url::parse(endpoint).map_err(|e| {
            SentinelError::UnreachableEndpoint(format!("invalid endpoint {endpoint:?}: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SentinelError::UnreachableEndpoint(e.to_string()))?;

        let mut connection = Self {
            client,
            url,
            chain_id: String::new(),
            request_id: AtomicU64::new(1),
        };

        let status: StatusResult = connection
            .call("status", json!({}))
            .await
            .map_err(|e| SentinelError::UnreachableEndpoint(format!("{endpoint}: {}", e.describe())))?;

        let actual = status.node_info.network;
        if let Some(expected) = expected_chain_id {
            if expected != actual {
                return Err(SentinelError::ChainIdMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        info!(
            endpoint,
            chain_id = %actual,
            height = status.sync_info.latest_block_height,
            "connected to chain"
        );
        connection.chain_id = actual;
        Ok(connection)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    /// Latest block height the node knows about.
    pub async fn height(&self) -> Result<u64, SentinelError> {
        let status: StatusResult = self
            .call("status", json!({}))
            .await
            .map_err(CallError::into_network)?;
        Ok(status.sync_info.latest_block_height)
    }

    /// Reads the current nonce of `address`.
    ///
    /// An account the chain has never seen yields `NotFound`.
    pub async fn get_nonce(&self, address: &Address) -> Result<Nonce, SentinelError> {
        let result: AbciQueryResult = self
            .call(
                "abci_query",
                json!({
                    "path": NONCE_QUERY_PATH,
                    "data": hex::encode(address.as_bytes()),
                    "prove": false,
                }),
            )
            .await
            .map_err(CallError::into_network)?;

        let response = result.response;
        let value = match response.value {
            Some(v) if response.code == 0 && !v.is_empty() => v,
            _ => {
                debug!(%address, code = response.code, log = %response.log, "no nonce on chain");
                return Err(SentinelError::NotFound(format!("no nonce recorded for {address}")));
            }
        };

        let raw = BASE64
            .decode(value)
            .map_err(|e| SentinelError::Network(format!("nonce is not base64: {e}")))?;
        let bytes: [u8; 8] = raw.try_into().map_err(|v: Vec<u8>| {
            SentinelError::Network(format!("nonce must be 8 bytes, got {}", v.len()))
        })?;

        let nonce = Nonce::from_be_bytes(bytes);
        debug!(%address, nonce, "read nonce");
        Ok(nonce)
    }

    /// Broadcasts encoded transaction bytes and waits for the commit.
    ///
    /// A non-zero check or deliver code is `RejectedByChain`; anything that
    /// prevented an answer is `Network`.
    pub async fn post_tx(&self, tx: &[u8]) -> Result<PostTxResponse, SentinelError> {
        let result: BroadcastCommitResult = self
            .call("broadcast_tx_commit", json!({ "tx": BASE64.encode(tx) }))
            .await
            .map_err(CallError::into_network)?;

        for (stage, outcome) in [("check", &result.check_tx), ("deliver", &result.deliver_tx)] {
            if outcome.code != 0 {
                warn!(stage, code = outcome.code, log = %outcome.log, "transaction rejected");
                return Err(SentinelError::RejectedByChain {
                    code: outcome.code,
                    log: outcome.log.clone(),
                });
            }
        }

        info!(hash = %result.hash, height = result.height, "transaction committed");
        Ok(PostTxResponse {
            hash: result.hash,
            height: result.height,
            log: result.deliver_tx.log,
        })
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, CallError> {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "rpc call");

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallError::Transport(format!(
                "HTTP status {} from {method}",
                response.status()
            )));
        }

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| CallError::Decode(format!("malformed {method} response: {e}")))?;

        if let Some(error) = body.error {
            let message = match error.data {
                Some(Value::String(data)) if !data.is_empty() => {
                    format!("{}: {}", error.message, data)
                }
                _ => error.message,
            };
            return Err(CallError::Rpc {
                code: error.code,
                message,
            });
        }

        body.result
            .ok_or_else(|| CallError::Decode(format!("{method} returned neither result nor error")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::address::{Algorithm, PublicKeyBundle};

    const CHAIN_ID: &str = "sentinel-mock";

    #[derive(Default)]
    struct MockNode {
        nonce: Option<u64>,
        deliver_code: u32,
        rpc_error: bool,
    }

    async fn handle(State(node): State<Arc<MockNode>>, Json(req): Json<Value>) -> Json<Value> {
        let id = req["id"].clone();
        let result = match req["method"].as_str().unwrap_or_default() {
            "status" => json!({
                "node_info": { "network": CHAIN_ID },
                "sync_info": { "latest_block_height": "1234" }
            }),
            "abci_query" => match node.nonce {
                Some(n) => json!({ "response": { "code": 0, "value": BASE64.encode(n.to_be_bytes()) } }),
                None => json!({ "response": { "code": 0, "log": "not found", "value": null } }),
            },
            "broadcast_tx_commit" if node.rpc_error => {
                return Json(json!({
                    "jsonrpc": "2.0", "id": id,
                    "error": { "code": -32603, "message": "Internal error", "data": "tx already exists in cache" }
                }));
            }
            "broadcast_tx_commit" => {
                let log = if node.deliver_code == 0 { "" } else { "invalid sequence" };
                json!({
                    "check_tx": { "code": 0 },
                    "deliver_tx": { "code": node.deliver_code, "log": log },
                    "hash": "ABCDEF",
                    "height": 1235
                })
            }
            other => panic!("unexpected method {other}"),
        };
        Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    async fn spawn_mock(node: MockNode) -> String {
        let app = Router::new()
            .route("/", post(handle))
            .with_state(Arc::new(node));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn address() -> Address {
        PublicKeyBundle::new(Algorithm::Ed25519, vec![8; 32])
            .unwrap()
            .address()
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn connect_reads_chain_id() {
        let url = spawn_mock(MockNode::default()).await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        assert_eq!(conn.chain_id(), CHAIN_ID);
        assert_eq!(conn.height().await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn connect_checks_expected_chain_id() {
        let url = spawn_mock(MockNode::default()).await;
        assert!(ChainConnection::connect(&url, Some(CHAIN_ID), TIMEOUT).await.is_ok());
        match ChainConnection::connect(&url, Some("other-chain"), TIMEOUT).await {
            Err(SentinelError::ChainIdMismatch { expected, actual }) => {
                assert_eq!(expected, "other-chain");
                assert_eq!(actual, CHAIN_ID);
            }
            Err(other) => panic!("expected ChainIdMismatch, got {other:?}"),
            Ok(_) => panic!("expected ChainIdMismatch, got a connection"),
        }
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = ChainConnection::connect(&format!("http://{addr}/"), None, TIMEOUT).await;
        assert!(matches!(result, Err(SentinelError::UnreachableEndpoint(_))));
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let result = ChainConnection::connect("not a url", None, TIMEOUT).await;
        assert!(matches!(result, Err(SentinelError::UnreachableEndpoint(_))));
    }

    #[tokio::test]
    async fn get_nonce_decodes_big_endian_value() {
        let url = spawn_mock(MockNode {
            nonce: Some(5),
            ..MockNode::default()
        })
        .await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        assert_eq!(conn.get_nonce(&address()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn get_nonce_of_unknown_account_is_not_found() {
        let url = spawn_mock(MockNode::default()).await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        assert!(matches!(
            conn.get_nonce(&address()).await,
            Err(SentinelError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn post_tx_returns_commit_info() {
        let url = spawn_mock(MockNode::default()).await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        let response = conn.post_tx(b"{}").await.unwrap();
        assert_eq!(response.hash, "ABCDEF");
        assert_eq!(response.height, 1235);
    }

    #[tokio::test]
    async fn post_tx_surfaces_deliver_failure() {
        let url = spawn_mock(MockNode {
            deliver_code: 4,
            ..MockNode::default()
        })
        .await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        match conn.post_tx(b"{}").await {
            Err(SentinelError::RejectedByChain { code, log }) => {
                assert_eq!(code, 4);
                assert_eq!(log, "invalid sequence");
            }
            other => panic!("expected RejectedByChain, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_tx_rpc_error_is_network_error() {
        let url = spawn_mock(MockNode {
            rpc_error: true,
            ..MockNode::default()
        })
        .await;
        let conn = ChainConnection::connect(&url, None, TIMEOUT).await.unwrap();
        match conn.post_tx(b"{}").await {
            Err(SentinelError::Network(msg)) => assert!(msg.contains("already exists"), "{msg}"),
            other => panic!("expected Network, got {other:?}"),
        }
    }
}
