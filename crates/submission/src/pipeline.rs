//! The vote submission pipeline.
//!
//! Orchestrates validation, duplicate detection and ledger submission, in
//! that order, short-circuiting on the first failure. The format check is
//! free and local so it runs first; the duplicate check runs before
//! submission so a vote that would be rejected anyway never pays ledger
//! fees. Under concurrency two submissions of the same code can still both
//! pass the history check (see `chains::ledger::scanner::VoteHistory`).

use std::sync::Arc;

use tracing::{info, warn};

use chains::ledger::{Ledger, VoteHistory};
use common::{VoteAnchorError, VoteCode};

/// Invoked exactly once per successful submission, with the accepted code
/// and the acknowledged transaction hash. The audit file itself is owned by
/// the caller, not by the pipeline.
pub type AuditHook = Arc<dyn Fn(&VoteCode, &str) + Send + Sync>;

/// Validator → history scan → ledger submission.
pub struct SubmissionPipeline {
    history: Arc<dyn VoteHistory>,
    ledger: Arc<dyn Ledger>,
    audit: Option<AuditHook>,
}

impl SubmissionPipeline {
    pub fn new(history: Arc<dyn VoteHistory>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            history,
            ledger,
            audit: None,
        }
    }

    /// Register the hook fired once per successful submission.
    pub fn with_audit_hook(mut self, hook: AuditHook) -> Self {
        self.audit = Some(hook);
        self
    }

    /// Submit a vote code; returns the acknowledged transaction hash.
    ///
    /// Failure taxonomy, in check order: `InvalidFormat`, `ScanUnavailable`
    /// (the dedup check fails closed, never open), `DuplicateVote`, then
    /// whatever the ledger submission reports.
    pub async fn submit_vote(&self, code: &str) -> Result<String, VoteAnchorError> {
        let code = VoteCode::parse(code)?;
        let payload = code.payload();

        if let Some(existing) = self.history.find(self.ledger.account(), &payload).await? {
            warn!(
                "Vote code already recorded in transaction {}",
                existing.hash
            );
            return Err(VoteAnchorError::DuplicateVote(existing.hash));
        }

        let hash = self.ledger.submit_payload(&payload).await?;
        info!("Vote accepted, transaction {}", hash);

        if let Some(audit) = &self.audit {
            audit(&code, &hash);
        }
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use chains::ledger::{Receipt, ReceiptSource, TransactionRecord};
    use common::VotePayload;

    const VALID_CODE: &str = "12304-45641-78979-01234";

    struct StubHistory {
        outcome: fn() -> Result<Option<TransactionRecord>, VoteAnchorError>,
        calls: AtomicUsize,
    }

    impl StubHistory {
        fn new(outcome: fn() -> Result<Option<TransactionRecord>, VoteAnchorError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VoteHistory for StubHistory {
        async fn find(
            &self,
            _account: &str,
            _payload: &VotePayload,
        ) -> Result<Option<TransactionRecord>, VoteAnchorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    struct StubLedger {
        submit_calls: AtomicUsize,
    }

    impl StubLedger {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                submit_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReceiptSource for StubLedger {
        async fn receipt(&self, _tx_hash: &str) -> Result<Option<Receipt>, VoteAnchorError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl Ledger for StubLedger {
        fn account(&self) -> &str {
            "0xaccount"
        }

        async fn submit_payload(&self, _payload: &VotePayload) -> Result<String, VoteAnchorError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            Ok("0xhash".to_string())
        }
    }

    fn duplicate_record() -> TransactionRecord {
        TransactionRecord {
            hash: "0xdup".to_string(),
            from: "0xaccount".to_string(),
            input: "0xaa".to_string(),
            block_number: "100".to_string(),
        }
    }

    #[tokio::test]
    async fn invalid_code_never_reaches_the_network() {
        let history = StubHistory::new(|| Ok(None));
        let ledger = StubLedger::new();
        let pipeline = SubmissionPipeline::new(history.clone(), ledger.clone());

        let err = pipeline.submit_vote("12304-45640-78979-01234").await;
        assert!(matches!(err, Err(VoteAnchorError::InvalidFormat)));
        assert_eq!(history.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_vote_is_rejected_before_submission() {
        let history = StubHistory::new(|| Ok(Some(duplicate_record())));
        let ledger = StubLedger::new();
        let pipeline = SubmissionPipeline::new(history.clone(), ledger.clone());

        let err = pipeline.submit_vote(VALID_CODE).await;
        match err {
            Err(VoteAnchorError::DuplicateVote(hash)) => assert_eq!(hash, "0xdup"),
            other => panic!("expected DuplicateVote, got {:?}", other.map(|_| ())),
        }
        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_outage_fails_closed() {
        let history = StubHistory::new(|| {
            Err(VoteAnchorError::ScanUnavailable("indexer down".to_string()))
        });
        let ledger = StubLedger::new();
        let pipeline = SubmissionPipeline::new(history.clone(), ledger.clone());

        let err = pipeline.submit_vote(VALID_CODE).await;
        assert!(matches!(err, Err(VoteAnchorError::ScanUnavailable(_))));
        assert_eq!(ledger.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fresh_vote_is_submitted_and_audited_once() {
        let history = StubHistory::new(|| Ok(None));
        let ledger = StubLedger::new();

        let audited: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = audited.clone();
        let pipeline = SubmissionPipeline::new(history.clone(), ledger.clone()).with_audit_hook(
            Arc::new(move |code, hash| {
                sink.lock()
                    .unwrap()
                    .push((code.as_str().to_string(), hash.to_string()));
            }),
        );

        let hash = pipeline.submit_vote(VALID_CODE).await.unwrap();
        assert_eq!(hash, "0xhash");
        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.submit_calls.load(Ordering::SeqCst), 1);

        let entries = audited.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], (VALID_CODE.to_string(), "0xhash".to_string()));
    }
}
