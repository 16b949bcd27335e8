//! Seatdraft allocation engine.
//!
//! Pure turn-advancement and allocation logic over a [`seatdraft_core::Snapshot`],
//! plus the [`Coordinator`] that binds those transitions to a persistent store
//! with compare-and-swap persists.

#![warn(missing_docs)]

mod error;

pub mod ledger;
pub mod roster;
pub mod transaction;
pub mod turn;

mod coordinator;

pub use coordinator::Coordinator;
pub use error::EngineError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
