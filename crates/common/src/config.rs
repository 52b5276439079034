//! Runtime configuration for the gateway.
//!
//! All settings come from environment variables with development defaults,
//! collected once into an immutable struct and injected at construction.
//! There is no process-global configuration state.

use std::path::PathBuf;

use crate::error::VoteAnchorError;

/// Default gas price in wei (10 gwei).
const DEFAULT_GAS_PRICE: u64 = 10_000_000_000;

/// Default gas limit cap for a vote transaction.
const DEFAULT_GAS_LIMIT: u64 = 314_150;

/// Immutable gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Ledger node JSON-RPC endpoint.
    pub node_url: String,
    /// Chain identifier included in every signed transaction.
    pub chain_id: u64,
    /// Hex-encoded 32-byte signing key. Required; there is no default key.
    pub signing_key_hex: String,
    /// Indexing service base URL for the account history query.
    pub indexer_url: String,
    /// API key appended to indexer queries.
    pub indexer_api_key: String,
    /// Gas price in wei.
    pub gas_price: u64,
    /// Upper bound on the gas limit of a vote transaction.
    pub gas_limit: u64,
    /// Listen address for the HTTP server.
    pub listen_addr: String,
    /// Append-only audit file of accepted vote codes.
    pub votes_file: PathBuf,
}

impl GatewayConfig {
    /// Build configuration from environment variables.
    ///
    /// `LEDGER_SIGNING_KEY` must be set; everything else has a development
    /// default.
    pub fn from_env() -> Result<Self, VoteAnchorError> {
        let signing_key_hex = std::env::var("LEDGER_SIGNING_KEY").map_err(|_| {
            VoteAnchorError::Configuration("LEDGER_SIGNING_KEY must be set".to_string())
        })?;

        Ok(Self {
            node_url: env_or("LEDGER_NODE_URL", "http://localhost:8545"),
            chain_id: env_parsed("LEDGER_CHAIN_ID", 3)?,
            signing_key_hex,
            indexer_url: env_or("INDEXER_API_URL", "http://localhost:8081/api"),
            indexer_api_key: env_or("INDEXER_API_KEY", ""),
            gas_price: env_parsed("LEDGER_GAS_PRICE", DEFAULT_GAS_PRICE)?,
            gas_limit: env_parsed("LEDGER_GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            listen_addr: env_or("GATEWAY_LISTEN_ADDR", "0.0.0.0:3000"),
            votes_file: PathBuf::from(env_or("VOTES_FILE_PATH", "votes.csv")),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed(name: &str, default: u64) -> Result<u64, VoteAnchorError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            VoteAnchorError::Configuration(format!("{} must be an integer, got {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
