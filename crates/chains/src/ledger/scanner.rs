//! Vote history scanner backed by a ledger indexing service.
//!
//! The indexer exposes a query-by-account API returning every transaction
//! the submitting account has sent, oldest first. Deduplication is a linear
//! scan of those records for a payload match. The scan is behind the
//! [`VoteHistory`] trait so an indexed lookup can replace it without
//! touching the submission pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{VoteAnchorError, VotePayload};

/// A historical transaction as reported by the indexing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    /// Transaction data field, hex with `0x` prefix.
    pub input: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
}

/// Point-in-time duplicate detection over an account's sent transactions.
///
/// This detects duplicates, it does not prevent them: two concurrent
/// submissions of the same code can both pass this check before either is
/// broadcast. An authoritative dedup layer has to sit in front of the
/// pipeline in production deployments.
#[async_trait]
pub trait VoteHistory: Send + Sync {
    /// First transaction sent by `account` whose data field equals
    /// `payload`, in the indexer's reported order.
    async fn find(
        &self,
        account: &str,
        payload: &VotePayload,
    ) -> Result<Option<TransactionRecord>, VoteAnchorError>;
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

/// Message the indexer uses for an empty history.
const NO_TRANSACTIONS: &str = "No transactions found";

/// Scanner against an explorer-style indexer
/// (`module=account&action=txlist` query shape).
pub struct IndexerScanner {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl IndexerScanner {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the full sent-transaction list for an account, oldest first.
    async fn fetch_history(
        &self,
        account: &str,
    ) -> Result<Vec<TransactionRecord>, VoteAnchorError> {
        let url = format!(
            "{}?module=account&action=txlist&address={}&startblock=0&endblock=99999999&sort=asc&apikey={}",
            self.base_url, account, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VoteAnchorError::ScanUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoteAnchorError::ScanUnavailable(format!(
                "indexer error {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VoteAnchorError::ScanUnavailable(e.to_string()))?;
        parse_history(&body)
    }
}

/// Parse the indexer's txlist response body.
///
/// An unreachable or malformed indexer must surface as `ScanUnavailable`,
/// never as an empty history: conflating the two would let a duplicate
/// through during an outage.
fn parse_history(body: &str) -> Result<Vec<TransactionRecord>, VoteAnchorError> {
    let response: TxListResponse = serde_json::from_str(body)
        .map_err(|e| VoteAnchorError::ScanUnavailable(format!("malformed response: {}", e)))?;

    // The indexer reports an empty history as a non-ok status with a
    // well-known message and a non-list result.
    if response.status != "1" {
        if response.message == NO_TRANSACTIONS {
            return Ok(Vec::new());
        }
        return Err(VoteAnchorError::ScanUnavailable(format!(
            "indexer status {}: {}",
            response.status, response.message
        )));
    }

    serde_json::from_value(response.result)
        .map_err(|e| VoteAnchorError::ScanUnavailable(format!("malformed record list: {}", e)))
}

/// First record whose data field equals the payload, in list order.
pub fn first_payload_match<'a>(
    records: &'a [TransactionRecord],
    payload_hex: &str,
) -> Option<&'a TransactionRecord> {
    records.iter().find(|record| record.input == payload_hex)
}

#[async_trait]
impl VoteHistory for IndexerScanner {
    async fn find(
        &self,
        account: &str,
        payload: &VotePayload,
    ) -> Result<Option<TransactionRecord>, VoteAnchorError> {
        let records = self.fetch_history(account).await?;
        debug!(
            "Scanned {} historical transactions for account {}",
            records.len(),
            account
        );
        Ok(first_payload_match(&records, &payload.to_hex()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, input: &str) -> TransactionRecord {
        TransactionRecord {
            hash: hash.to_string(),
            from: "0xsender".to_string(),
            input: input.to_string(),
            block_number: "100".to_string(),
        }
    }

    #[test]
    fn finds_first_match_in_order() {
        let records = vec![
            record("0x1", "0xaa"),
            record("0x2", "0xbb"),
            record("0x3", "0xbb"),
        ];
        let found = first_payload_match(&records, "0xbb").unwrap();
        assert_eq!(found.hash, "0x2");
    }

    #[test]
    fn no_match_on_empty_or_missing() {
        assert!(first_payload_match(&[], "0xaa").is_none());
        let records = vec![record("0x1", "0xaa")];
        assert!(first_payload_match(&records, "0xcc").is_none());
    }

    #[test]
    fn scan_is_idempotent_over_fixed_records() {
        let records = vec![record("0x1", "0xaa"), record("0x2", "0xbb")];
        let first = first_payload_match(&records, "0xbb").map(|r| r.hash.clone());
        let second = first_payload_match(&records, "0xbb").map(|r| r.hash.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn parses_record_list() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [
                {"hash": "0x1", "from": "0xsender", "input": "0xaa", "blockNumber": "91827"},
                {"hash": "0x2", "from": "0xsender", "input": "0xbb", "blockNumber": "91830"}
            ]
        }"#;
        let records = parse_history(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hash, "0x1");
        assert_eq!(records[1].block_number, "91830");
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let body = r#"{"status": "0", "message": "No transactions found", "result": []}"#;
        assert!(parse_history(body).unwrap().is_empty());
    }

    #[test]
    fn indexer_failure_is_scan_unavailable_not_empty() {
        let rate_limited =
            r#"{"status": "0", "message": "Max rate limit reached", "result": null}"#;
        assert!(matches!(
            parse_history(rate_limited),
            Err(VoteAnchorError::ScanUnavailable(_))
        ));

        assert!(matches!(
            parse_history("<html>bad gateway</html>"),
            Err(VoteAnchorError::ScanUnavailable(_))
        ));
    }
}
