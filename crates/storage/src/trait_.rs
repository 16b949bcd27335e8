//! Store trait abstraction.

use async_trait::async_trait;
use seatdraft_core::{Participant, Round, School, Snapshot, Version, VersionedSnapshot};
use tokio::sync::watch;

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compare-and-swap persist lost the race to another writer
    #[error("version conflict: snapshot {expected} is stale")]
    Conflict {
        /// The version the writer expected to replace
        expected: Version,
    },

    /// Stored state failed to parse
    #[error("corrupt store: {0}")]
    Corrupt(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Store abstraction for the shared allocation state.
///
/// A store holds exactly one [`Snapshot`] plus a monotonically increasing
/// [`Version`]. Every persist is all-or-nothing: callers pass the version
/// they read, and the store rejects the write with [`StoreError::Conflict`]
/// if anything was persisted in between.
#[async_trait]
pub trait Store: Send + Sync {
    /// Load the current snapshot together with its version.
    async fn load(&self) -> Result<VersionedSnapshot>;

    /// Persist `next` as one atomic unit, replacing the snapshot at
    /// `expected`. Returns the new version.
    async fn persist(&self, next: &Snapshot, expected: Version) -> Result<Version>;

    /// Read the participant list.
    async fn read_participants(&self) -> Result<Vec<Participant>> {
        Ok(self.load().await?.snapshot.participants)
    }

    /// Read the school list.
    async fn read_schools(&self) -> Result<Vec<School>> {
        Ok(self.load().await?.snapshot.schools)
    }

    /// Read the current round.
    async fn read_round(&self) -> Result<Round> {
        Ok(self.load().await?.snapshot.round)
    }

    /// Push notification channel carrying the latest persisted version,
    /// when the backend supports one. The channel only fires for writes
    /// made through this store instance, so callers must still poll
    /// [`Store::load`] to see writes from other processes.
    fn watch(&self) -> Option<watch::Receiver<Version>> {
        None
    }
}
