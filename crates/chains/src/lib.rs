//! Ledger-facing code for the vote anchoring system.
//!
//! This crate provides:
//! - A JSON-RPC client for the ledger node (fees, nonces, broadcast,
//!   receipts)
//! - Transaction building and local signing
//! - The indexer-backed vote history scanner used for deduplication

pub mod ledger;
