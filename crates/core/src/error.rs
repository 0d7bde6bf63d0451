//! Failure taxonomy for store operations.

use thiserror::Error;

/// Failures reported by the catalogue store and the rental ledger.
///
/// Not-found and wrong-state conditions are distinct variants so callers
/// can word their messages precisely. None of these are fatal; the
/// interactive session carries on after any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required field was empty or missing.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    /// No game carries the given id.
    #[error("no game with id {0}")]
    GameNotFound(u64),
    /// The game exists but is already out on rental.
    #[error("game {0} is not available")]
    GameUnavailable(u64),
    /// No rental carries the given code.
    #[error("no rental with code {0}")]
    RentalNotFound(String),
    /// The rental was already closed.
    #[error("rental {0} was already returned")]
    AlreadyReturned(String),
}
