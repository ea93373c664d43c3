use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U128, U64};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ChainClientError;
use crate::types::{BlockSnapshot, RpcBlock, RpcReceipt, TxReceipt};

/// Everything the keeper needs from a node.
///
/// Implementations perform one round-trip per call and never retry; a
/// failure carries the method and arguments so the caller can decide.
/// Each monitor owns its client, so implementations need no shared state.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Head of the chain (`eth_getBlockByNumber("latest")`).
    async fn latest_block(&self) -> Result<BlockSnapshot, ChainClientError>;

    /// Read-only contract call (`eth_call` against `latest`). Returns raw return data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainClientError>;

    async fn chain_id(&self) -> Result<u64, ChainClientError>;

    /// Next nonce for `account`, counting pending transactions.
    async fn transaction_count(&self, account: Address) -> Result<u64, ChainClientError>;

    /// Legacy gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainClientError>;

    /// Broadcast a signed, EIP-2718 encoded transaction. Returns its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainClientError>;

    /// `Ok(None)` while the transaction is not yet included.
    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TxReceipt>, ChainClientError>;

    /// Poll for the receipt of `tx_hash` until it is included.
    ///
    /// A reverted receipt, a failed poll, or running past `timeout` (when set)
    /// all end in an error; none of them are retried here.
    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<TxReceipt, ChainClientError> {
        let wait = async {
            loop {
                match self.transaction_receipt(tx_hash).await {
                    Err(e) => return Err(e),
                    Ok(Some(receipt)) if receipt.success => return Ok(receipt),
                    Ok(Some(receipt)) => {
                        return Err(ChainClientError::TransactionFailed {
                            tx_hash,
                            reason: format!("reverted in block {}", receipt.block_number),
                        })
                    }
                    Ok(None) => tokio::time::sleep(poll_interval).await,
                }
            }
        };

        match timeout {
            None => wait.await,
            Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or_else(|_| {
                Err(ChainClientError::TransactionFailed {
                    tx_hash,
                    reason: format!("not confirmed within {limit:?}"),
                })
            }),
        }
    }
}

// ============================================================================
// JSON-RPC primitives
// ============================================================================

#[derive(Serialize)]
struct JsonRpcRequest<P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

// ============================================================================
// RpcChainClient
// ============================================================================

/// [`ChainClient`] over a single HTTP(S) JSON-RPC endpoint.
pub struct RpcChainClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcChainClient {
    pub fn new(url: &str) -> Self {
        Self::with_http(url, reqwest::Client::new())
    }

    /// Client whose every request is bounded by `timeout`.
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ChainClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainClientError::Network {
                method: "connect",
                context: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self::with_http(url, http))
    }

    fn with_http(url: &str, http: reqwest::Client) -> Self {
        Self {
            url: url.to_owned(),
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One JSON-RPC round-trip. `context` is a short rendering of the
    /// arguments used in error messages.
    async fn request<P, R>(
        &self,
        method: &'static str,
        params: P,
        context: String,
    ) -> Result<R, ChainClientError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(method, id = req.id, args = %context, "rpc request");

        let network = |reason: String| ChainClientError::Network {
            method,
            context: context.clone(),
            reason,
        };

        let body = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| network(format!("HTTP error: {e}")))?
            .error_for_status()
            .map_err(|e| network(format!("HTTP status: {e}")))?
            .text()
            .await
            .map_err(|e| network(format!("reading body: {e}")))?;

        let resp: JsonRpcResponse = serde_json::from_str(&body)
            .map_err(|e| network(format!("malformed JSON-RPC response: {e}")))?;

        decode_response(method, &context, resp)
    }
}

fn decode_response<R: DeserializeOwned>(
    method: &'static str,
    context: &str,
    resp: JsonRpcResponse,
) -> Result<R, ChainClientError> {
    let chain = |reason: String| ChainClientError::Chain {
        method,
        context: context.to_owned(),
        reason,
    };

    if let Some(err) = resp.error {
        let mut reason = format!("code={} msg={}", err.code, err.message);
        if let Some(data) = err.data {
            reason.push_str(&format!(" data={data}"));
        }
        return Err(chain(reason));
    }

    serde_json::from_value(resp.result.unwrap_or(Value::Null))
        .map_err(|e| chain(format!("unexpected result: {e}")))
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn latest_block(&self) -> Result<BlockSnapshot, ChainClientError> {
        let block: RpcBlock = self
            .request("eth_getBlockByNumber", json!(["latest", false]), "latest".into())
            .await?;
        Ok(block.into())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainClientError> {
        let context = format!("to={to}, data={data}");
        self.request(
            "eth_call",
            json!([{ "to": to, "data": data }, "latest"]),
            context,
        )
        .await
    }

    async fn chain_id(&self) -> Result<u64, ChainClientError> {
        let id: U64 = self.request("eth_chainId", json!([]), String::new()).await?;
        Ok(id.to::<u64>())
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, ChainClientError> {
        let nonce: U64 = self
            .request(
                "eth_getTransactionCount",
                json!([account, "pending"]),
                format!("{account}, pending"),
            )
            .await?;
        Ok(nonce.to::<u64>())
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        let price: U128 = self.request("eth_gasPrice", json!([]), String::new()).await?;
        Ok(price.to::<u128>())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainClientError> {
        let context = format!("{} bytes", raw.len());
        self.request("eth_sendRawTransaction", json!([raw]), context)
            .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TxReceipt>, ChainClientError> {
        let receipt: Option<RpcReceipt> = self
            .request(
                "eth_getTransactionReceipt",
                json!([tx_hash]),
                tx_hash.to_string(),
            )
            .await?;
        Ok(receipt.and_then(RpcReceipt::into_receipt))
    }
}
