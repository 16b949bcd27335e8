//! Engine error kinds.

use seatdraft_core::Term;
use seatdraft_storage::StoreError;

/// Errors produced by allocation operations.
///
/// All of these are semantic failures: the transaction leaves persisted
/// state unchanged and the caller may retry with different input.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Participant or school id unknown
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller does not hold the active rank
    #[error("not your turn (active rank: {active:?})")]
    NotYourTurn {
        /// The rank currently authorized to act, if the round is still open
        active: Option<u32>,
    },

    /// Both the term pool and the flexible pool are exhausted
    #[error("no seats available for {term}")]
    NoCapacity {
        /// The requested term
        term: Term,
    },

    /// Round-2 pick reuses the round-1 term
    #[error("both rounds cannot use the same term")]
    DuplicateTerm,

    /// Round-2 pick reuses the round-1 school
    #[error("both rounds cannot use the same school")]
    DuplicateSchool,

    /// Malformed bulk-load input
    #[error("invalid bulk-load input: {0}")]
    Validation(String),

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}
