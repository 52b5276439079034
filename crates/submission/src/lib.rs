//! Vote submission orchestration.
//!
//! This crate provides:
//! - The submission pipeline: validate, deduplicate against ledger
//!   history, then submit
//! - The receipt tracker: cancellable polling until the ledger reports a
//!   confirmation receipt

pub mod pipeline;
pub mod tracker;

pub use pipeline::{AuditHook, SubmissionPipeline};
pub use tracker::{ReceiptTracker, TrackerState, DEFAULT_POLL_INTERVAL};
