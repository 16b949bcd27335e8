//! Seatdraft core data models.
//!
//! This crate defines the data structures shared by the allocation engine,
//! the storage backends, and the synchronization layer.

#![warn(missing_docs)]

// Roster entities
mod participant;
mod school;

// Shared state
mod snapshot;

// Bulk-load rows
mod roster;

// Re-exports
pub use participant::{Participant, ParticipantStatus, Selection};
pub use school::{School, Term};
pub use snapshot::{Round, Snapshot, Version, VersionedSnapshot};
pub use roster::{ParticipantRow, SchoolRow};
