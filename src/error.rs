//! Error taxonomy for the placement core
//!
//! A rejected drop is not an error; see [`crate::sim::DropOutcome`].

use thiserror::Error;

use crate::sim::ItemId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PuzzleError {
    /// Empty or malformed setup. Raised before any state is mutated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Programming error inside the core (e.g. advancing an exhausted sequence)
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("unknown item {0:?}")]
    UnknownItem(ItemId),
}

impl From<serde_json::Error> for PuzzleError {
    fn from(err: serde_json::Error) -> Self {
        PuzzleError::Configuration(format!("malformed setup JSON: {err}"))
    }
}
