//! CLI commands.

mod vote;

pub use vote::*;
