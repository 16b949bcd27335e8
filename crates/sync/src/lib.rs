//! State synchronization for seatdraft clients.
//!
//! A [`SyncClient`] holds a local copy of the shared snapshot and reconciles
//! it against the authoritative store, keeping one participant session bound
//! across refreshes. Change propagation polls the store; a store's push
//! channel, when present, only wakes the poll loop early.

#![warn(missing_docs)]

mod client;
mod notify;

pub use client::{Session, SyncClient, SyncError};
pub use notify::{changes, DEFAULT_POLL_INTERVAL};

/// Result alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
