//! Application state for the gateway.

use std::sync::Arc;

use chains::ledger::{IndexerScanner, LedgerClient};
use common::{GatewayConfig, VoteAnchorError};
use submission::{AuditHook, SubmissionPipeline};

use crate::audit::VoteAuditLog;

/// Shared state: the submission pipeline and the ledger client used for
/// receipt lookups.
pub struct AppState {
    pub pipeline: SubmissionPipeline,
    pub ledger: Arc<LedgerClient>,
}

impl AppState {
    /// Wire up the pipeline from configuration: indexer scanner for dedup,
    /// ledger client for submission, audit log hooked to accepted votes.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, VoteAnchorError> {
        let ledger = Arc::new(LedgerClient::from_config(config)?);
        let scanner = Arc::new(IndexerScanner::new(
            config.indexer_url.clone(),
            config.indexer_api_key.clone(),
        ));

        let audit = Arc::new(VoteAuditLog::open(&config.votes_file)?);
        let hook: AuditHook = Arc::new(move |code, hash| audit.append(code, hash));

        let pipeline =
            SubmissionPipeline::new(scanner, ledger.clone()).with_audit_hook(hook);

        Ok(Self { pipeline, ledger })
    }
}
