//! Error types for the vote anchoring system.

/// Error taxonomy for vote submission and receipt tracking.
///
/// Business-rule failures (`InvalidFormat`, `DuplicateVote`) are distinct
/// from infrastructure failures (`ScanUnavailable`, `NodeCommunication`) so
/// callers can tell "your vote was rejected" apart from "we could not reach
/// the network".
#[derive(Debug, thiserror::Error)]
pub enum VoteAnchorError {
    #[error("invalid vote code format")]
    InvalidFormat,

    #[error("vote code already recorded in transaction {0}")]
    DuplicateVote(String),

    #[error("vote history unavailable: {0}")]
    ScanUnavailable(String),

    #[error("fee estimation failed: {0}")]
    FeeEstimationFailed(String),

    #[error("broadcast rejected by node: {0}")]
    BroadcastRejected(String),

    #[error("receipt unavailable: {0}")]
    ReceiptUnavailable(String),

    #[error("node communication error: {0}")]
    NodeCommunication(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VoteAnchorError {
    /// Whether this failure is safe to retry with the same vote code.
    ///
    /// `DuplicateVote` is terminal for the code; `InvalidFormat` needs a
    /// corrected code. Everything else is an infrastructure fault that a
    /// later attempt may clear (with a fresh nonce and fee).
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            VoteAnchorError::InvalidFormat | VoteAnchorError::DuplicateVote(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_split() {
        assert!(!VoteAnchorError::InvalidFormat.is_retryable());
        assert!(!VoteAnchorError::DuplicateVote("0xabc".into()).is_retryable());
        assert!(VoteAnchorError::ScanUnavailable("timeout".into()).is_retryable());
        assert!(VoteAnchorError::BroadcastRejected("stale nonce".into()).is_retryable());
    }
}
