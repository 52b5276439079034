//! Receipt confirmation tracking.
//!
//! A spawned task polls the ledger for a receipt at a fixed interval until
//! one appears or the caller cancels. The tracker imposes no timeout or
//! retry cap of its own; polling is bounded only by cancellation, which
//! takes effect at the next tick boundary with no further lookups and
//! nothing reported.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::debug;

use chains::ledger::{Receipt, ReceiptSource};
use common::VoteAnchorError;

/// Default interval between receipt lookups.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Observable tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Pending,
    Confirmed,
    Cancelled,
}

/// Polls for a confirmation receipt until found or cancelled.
///
/// The receipt is surfaced exactly once, through [`ReceiptTracker::wait`].
pub struct ReceiptTracker {
    state: watch::Receiver<TrackerState>,
    receipt_rx: oneshot::Receiver<Receipt>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ReceiptTracker {
    /// Start tracking a transaction.
    pub fn spawn(
        source: Arc<dyn ReceiptSource>,
        tx_hash: String,
        poll_interval: Duration,
    ) -> Self {
        let (receipt_tx, receipt_rx) = oneshot::channel();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let (state_tx, state) = watch::channel(TrackerState::Pending);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    // Cancellation wins over a due tick, and dropping the
                    // tracker handle stops the loop the same way.
                    biased;
                    _ = &mut cancel_rx => {
                        let _ = state_tx.send(TrackerState::Cancelled);
                        debug!("Receipt tracking cancelled for {}", tx_hash);
                        return;
                    }
                    _ = ticker.tick() => {
                        match source.receipt(&tx_hash).await {
                            Ok(Some(receipt)) => {
                                let _ = state_tx.send(TrackerState::Confirmed);
                                debug!("Receipt found for {}", tx_hash);
                                let _ = receipt_tx.send(receipt);
                                return;
                            }
                            Ok(None) => {}
                            Err(VoteAnchorError::ReceiptUnavailable(reason)) => {
                                // Transient lookup failure; still pending.
                                debug!("Receipt lookup for {} unavailable: {}", tx_hash, reason);
                            }
                            Err(e) => {
                                debug!("Receipt lookup for {} failed: {}", tx_hash, e);
                            }
                        }
                    }
                }
            }
        });

        Self {
            state,
            receipt_rx,
            cancel_tx: Some(cancel_tx),
        }
    }

    /// Current state of the tracker.
    pub fn state(&self) -> TrackerState {
        *self.state.borrow()
    }

    /// Stop tracking. No further lookups are issued and nothing more is
    /// reported.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            let _ = cancel.send(());
        }
    }

    /// Wait for the receipt. Returns `None` if the tracker was cancelled
    /// first; otherwise waits indefinitely for confirmation.
    pub async fn wait(self) -> Option<Receipt> {
        self.receipt_rx.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Receipt source that reports the scripted outcomes in order, then
    /// keeps answering "not yet included".
    struct ScriptedSource {
        outcomes: Vec<Result<Option<Receipt>, VoteAnchorError>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Option<Receipt>, VoteAnchorError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn receipt(hash: &str) -> Receipt {
        Receipt {
            transaction_hash: hash.to_string(),
            block_number: Some(1),
            status: Some(true),
            extra: serde_json::Map::new(),
        }
    }

    #[async_trait]
    impl ReceiptSource for ScriptedSource {
        async fn receipt(&self, _tx_hash: &str) -> Result<Option<Receipt>, VoteAnchorError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.get(index) {
                Some(Ok(Some(r))) => Ok(Some(r.clone())),
                Some(Ok(None)) | None => Ok(None),
                Some(Err(VoteAnchorError::ReceiptUnavailable(reason))) => {
                    Err(VoteAnchorError::ReceiptUnavailable(reason.clone()))
                }
                Some(Err(_)) => Err(VoteAnchorError::ReceiptUnavailable("scripted".into())),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_once_receipt_appears() {
        let source = ScriptedSource::new(vec![
            Ok(None),
            Ok(None),
            Ok(Some(receipt("0xdone"))),
        ]);
        let tracker = ReceiptTracker::spawn(
            source.clone(),
            "0xdone".to_string(),
            DEFAULT_POLL_INTERVAL,
        );
        assert_eq!(tracker.state(), TrackerState::Pending);

        let found = tracker.wait().await.expect("receipt should arrive");
        assert_eq!(found.transaction_hash, "0xdone");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_lookup_failures_keep_polling() {
        let source = ScriptedSource::new(vec![
            Err(VoteAnchorError::ReceiptUnavailable("node restarting".into())),
            Err(VoteAnchorError::ReceiptUnavailable("node restarting".into())),
            Ok(Some(receipt("0xdone"))),
        ]);
        let tracker = ReceiptTracker::spawn(
            source.clone(),
            "0xdone".to_string(),
            DEFAULT_POLL_INTERVAL,
        );

        assert!(tracker.wait().await.is_some());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling_and_reports_nothing() {
        let source = ScriptedSource::new(vec![]);
        let mut tracker = ReceiptTracker::spawn(
            source.clone(),
            "0xnever".to_string(),
            DEFAULT_POLL_INTERVAL,
        );

        tracker.cancel();
        assert!(tracker.wait().await.is_none());

        // Long after cancellation, no lookup was ever issued.
        tokio::time::advance(DEFAULT_POLL_INTERVAL * 10).await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_state_is_observable() {
        let source = ScriptedSource::new(vec![]);
        let mut tracker = ReceiptTracker::spawn(
            source.clone(),
            "0xnever".to_string(),
            DEFAULT_POLL_INTERVAL,
        );
        tracker.cancel();

        // Yield until the tracker task observes the cancellation.
        while tracker.state() != TrackerState::Cancelled {
            tokio::task::yield_now().await;
        }
    }
}
