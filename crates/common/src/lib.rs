//! Shared types for the vote anchoring system.
//!
//! This crate provides:
//! - Vote-code parsing and check-digit validation
//! - The canonical ledger payload encoding
//! - The error taxonomy shared across crates
//! - Runtime configuration

pub mod config;
pub mod error;
pub mod votecode;

pub use config::GatewayConfig;
pub use error::VoteAnchorError;
pub use votecode::{check_digit, validate, VoteCode, VotePayload, GROUP_SIZE, NUM_GROUPS};
