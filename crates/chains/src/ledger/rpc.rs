//! Ledger node JSON-RPC client.
//!
//! Wraps the four node operations the system needs: fee estimation, nonce
//! lookup, raw transaction broadcast, and receipt lookup. The node's error
//! objects are kept separate from transport failures so each operation can
//! surface the right member of the error taxonomy.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use common::{GatewayConfig, VoteAnchorError, VotePayload};

use super::transaction::{build_vote_transaction, TransactionSigner};
use super::{Ledger, ReceiptSource};

/// Confirmation receipt reported by the node for an included transaction.
///
/// Only the fields the system interprets are typed; everything else the
/// node reports is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// How an RPC call failed: at the transport, in the node, or in decoding.
#[derive(Debug)]
enum RpcFailure {
    Transport(String),
    Node { code: i64, message: String },
    Malformed(String),
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcFailure::Transport(msg) => write!(f, "transport error: {}", msg),
            RpcFailure::Node { code, message } => write!(f, "node error {}: {}", code, message),
            RpcFailure::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Client for the ledger node, holding the signing identity.
///
/// The signing key is read-only for the lifetime of the client and shared
/// across concurrent submissions; it is never copied out.
pub struct LedgerClient {
    url: String,
    chain_id: u64,
    gas_price: u64,
    gas_limit: u64,
    signer: TransactionSigner,
    client: reqwest::Client,
}

impl LedgerClient {
    /// Build the client from gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, VoteAnchorError> {
        let signer = TransactionSigner::from_hex(&config.signing_key_hex)?;
        info!("Ledger client ready, account {}", signer.account());
        Ok(Self {
            url: config.node_url.clone(),
            chain_id: config.chain_id,
            gas_price: config.gas_price,
            gas_limit: config.gas_limit,
            signer,
            client: reqwest::Client::new(),
        })
    }

    /// Make a JSON-RPC call, treating a null result as an error.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcFailure> {
        self.call_optional(method, params).await?.ok_or_else(|| {
            RpcFailure::Malformed(format!("{} returned a null result", method))
        })
    }

    /// Make a JSON-RPC call where a null result is a valid answer.
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>, RpcFailure> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RpcFailure::Transport(format!("HTTP {}: {}", status, body)));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(RpcFailure::Node {
                code: error.code,
                message: error.message,
            });
        }

        Ok(parsed.result)
    }

    /// Estimate the gas cost of recording a payload.
    ///
    /// Any failure here fails the submission; there is no fallback to a
    /// guessed value.
    pub async fn estimate_fee(&self, payload: &VotePayload) -> Result<u64, VoteAnchorError> {
        self.call(
            "ledger_estimateFee",
            vec![json!({
                "to": self.signer.account(),
                "data": payload.to_hex(),
            })],
        )
        .await
        .map_err(|e| VoteAnchorError::FeeEstimationFailed(e.to_string()))
    }

    /// Current on-chain transaction count of the signing account.
    pub async fn transaction_count(&self) -> Result<u64, VoteAnchorError> {
        self.call("ledger_getTransactionCount", vec![json!(self.signer.account())])
            .await
            .map_err(|e| VoteAnchorError::NodeCommunication(e.to_string()))
    }

    /// Broadcast a raw signed transaction; returns the hash the node
    /// acknowledged.
    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String, VoteAnchorError> {
        self.call("ledger_sendRawTransaction", vec![json!(raw_hex)])
            .await
            .map_err(|e| match e {
                // A node error object is a rejection with a reason (stale
                // nonce, insufficient fee); everything else never reached
                // the pending pool.
                RpcFailure::Node { message, .. } => VoteAnchorError::BroadcastRejected(message),
                other => VoteAnchorError::NodeCommunication(other.to_string()),
            })
    }
}

#[async_trait]
impl ReceiptSource for LedgerClient {
    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, VoteAnchorError> {
        self.call_optional("ledger_getTransactionReceipt", vec![json!(tx_hash)])
            .await
            .map_err(|e| VoteAnchorError::ReceiptUnavailable(e.to_string()))
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    fn account(&self) -> &str {
        self.signer.account()
    }

    async fn submit_payload(&self, payload: &VotePayload) -> Result<String, VoteAnchorError> {
        let gas = self.estimate_fee(payload).await?.min(self.gas_limit);

        // Fetched immediately before signing to keep the staleness window
        // small; never cached across submissions.
        let nonce = self.transaction_count().await?;
        debug!("Submitting vote transaction, nonce {}, gas {}", nonce, gas);

        let unsigned = build_vote_transaction(
            self.signer.account(),
            payload,
            nonce,
            gas,
            self.gas_price,
            self.chain_id,
        );
        let signed = self.signer.sign(unsigned)?;
        let hash = self.send_raw_transaction(&signed.raw_hex()?).await?;

        info!("Vote transaction accepted by node: {}", hash);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_parses_node_fields_and_extras() {
        let raw = r#"{
            "transactionHash": "0xabc123",
            "blockNumber": 4182712,
            "status": true,
            "gasUsed": 21512,
            "logs": []
        }"#;
        let receipt: Receipt = serde_json::from_str(raw).unwrap();
        assert_eq!(receipt.transaction_hash, "0xabc123");
        assert_eq!(receipt.block_number, Some(4182712));
        assert_eq!(receipt.status, Some(true));
        assert_eq!(receipt.extra["gasUsed"], 21512);
    }

    #[test]
    fn receipt_tolerates_missing_inclusion_fields() {
        let receipt: Receipt =
            serde_json::from_str(r#"{"transactionHash": "0xabc123"}"#).unwrap();
        assert_eq!(receipt.block_number, None);
        assert_eq!(receipt.status, None);
    }

    #[test]
    fn rpc_response_splits_result_and_error() {
        let ok: RpcResponse<u64> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":42}"#).unwrap();
        assert_eq!(ok.result, Some(42));
        assert!(ok.error.is_none());

        let rejected: RpcResponse<String> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":null,
                "error":{"code":-32000,"message":"nonce too low"}}"#,
        )
        .unwrap();
        assert!(rejected.result.is_none());
        let error = rejected.error.unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "nonce too low");
    }
}
