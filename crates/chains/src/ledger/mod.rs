//! Ledger node support.
//!
//! Includes:
//! - Transaction building and signing
//! - JSON-RPC node client (fee estimation, nonce, broadcast, receipts)
//! - Indexer-backed history scanner for vote deduplication

pub mod rpc;
pub mod scanner;
pub mod transaction;

pub use rpc::*;
pub use scanner::*;
pub use transaction::*;

use async_trait::async_trait;
use common::{VoteAnchorError, VotePayload};

/// Read side of the ledger: receipt lookup by transaction hash.
///
/// Idempotent and side-effect-free; `None` means the transaction is not yet
/// included in a block, which is a valid state, not an error.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, VoteAnchorError>;
}

/// Write side of the ledger: payload submission under a fixed account.
#[async_trait]
pub trait Ledger: ReceiptSource {
    /// The submitting account, also the destination of every vote
    /// transaction.
    fn account(&self) -> &str;

    /// Record a payload on the ledger and return the transaction hash the
    /// node acknowledged. Acknowledgement means pending-pool acceptance,
    /// not confirmation.
    async fn submit_payload(&self, payload: &VotePayload) -> Result<String, VoteAnchorError>;
}
