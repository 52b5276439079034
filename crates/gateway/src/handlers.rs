//! HTTP handlers for vote submission and receipt status.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chains::ledger::{Receipt, ReceiptSource};
use common::VoteAnchorError;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    pub votecode: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitVoteResponse {
    /// Transaction hash acknowledged by the ledger node.
    pub hash: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiptStatusResponse {
    /// The receipt once the transaction is included; `null` while pending.
    pub receipt: Option<Receipt>,
    pub status: Option<String>,
}

/// Submit a vote code.
///
/// POST /vote
pub async fn submit_vote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitVoteRequest>,
) -> Result<Json<SubmitVoteResponse>, (StatusCode, String)> {
    info!("Vote submission received");

    match state.pipeline.submit_vote(&request.votecode).await {
        Ok(hash) => Ok(Json(SubmitVoteResponse {
            hash,
            status: "Validating your vote... You can check the status with the transaction hash"
                .to_string(),
        })),
        Err(e) => {
            warn!("Vote submission failed: {}", e);
            Err((error_status(&e), e.to_string()))
        }
    }
}

/// Receipt status for a submitted vote.
///
/// GET /vote/status/:hash
pub async fn receipt_status(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<ReceiptStatusResponse>, (StatusCode, String)> {
    info!("Receipt status requested for {}", hash);

    match state.ledger.receipt(&hash).await {
        Ok(Some(receipt)) => Ok(Json(ReceiptStatusResponse {
            receipt: Some(receipt),
            status: Some(
                "Your vote was posted to the ledger, here is the transaction receipt".to_string(),
            ),
        })),
        // Not yet included: a valid pending answer, not an error.
        Ok(None) => Ok(Json(ReceiptStatusResponse {
            receipt: None,
            status: None,
        })),
        Err(e) => {
            warn!("Receipt lookup failed for {}: {}", hash, e);
            Err((error_status(&e), e.to_string()))
        }
    }
}

/// Health check.
///
/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Map the error taxonomy onto HTTP status codes: the voter's mistakes are
/// 4xx, infrastructure faults are 5xx, and an unreachable dependency is
/// distinguishable from a rejection.
fn error_status(error: &VoteAnchorError) -> StatusCode {
    match error {
        VoteAnchorError::InvalidFormat => StatusCode::BAD_REQUEST,
        VoteAnchorError::DuplicateVote(_) => StatusCode::CONFLICT,
        VoteAnchorError::ScanUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        VoteAnchorError::FeeEstimationFailed(_)
        | VoteAnchorError::BroadcastRejected(_)
        | VoteAnchorError::ReceiptUnavailable(_)
        | VoteAnchorError::NodeCommunication(_) => StatusCode::BAD_GATEWAY,
        VoteAnchorError::Serialization(_) | VoteAnchorError::Configuration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voter_errors_map_to_4xx() {
        assert_eq!(
            error_status(&VoteAnchorError::InvalidFormat),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&VoteAnchorError::DuplicateVote("0xdup".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn infrastructure_errors_map_to_5xx() {
        assert_eq!(
            error_status(&VoteAnchorError::ScanUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&VoteAnchorError::BroadcastRejected("nonce too low".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&VoteAnchorError::FeeEstimationFailed("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
