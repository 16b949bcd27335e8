//! In-memory store.
//!
//! Backs tests and single-process demo runs. Same CAS semantics as the
//! durable backends.

use async_trait::async_trait;
use seatdraft_core::{Snapshot, Version, VersionedSnapshot};
use tokio::sync::{watch, RwLock};

use super::trait_::{Result, Store, StoreError};

/// Process-local store holding the snapshot behind an RwLock.
pub struct MemoryStore {
    state: RwLock<VersionedSnapshot>,
    notify: watch::Sender<Version>,
}

impl MemoryStore {
    /// Create a store seeded with an empty round-1 snapshot at version 0.
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::empty())
    }

    /// Create a store seeded with the given snapshot at version 0.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: RwLock::new(VersionedSnapshot {
                version: 0,
                snapshot,
            }),
            notify,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<VersionedSnapshot> {
        Ok(self.state.read().await.clone())
    }

    async fn persist(&self, next: &Snapshot, expected: Version) -> Result<Version> {
        let mut state = self.state.write().await;
        if state.version != expected {
            return Err(StoreError::Conflict { expected });
        }
        state.version = expected + 1;
        state.snapshot = next.clone();
        let _ = self.notify.send(state.version);
        Ok(state.version)
    }

    fn watch(&self) -> Option<watch::Receiver<Version>> {
        Some(self.notify.subscribe())
    }
}
