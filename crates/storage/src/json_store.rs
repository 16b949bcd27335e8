//! JSON file store implementation.
//!
//! Stores the whole versioned snapshot as one JSON document. Writes go to a
//! sibling temp file and land via rename, so readers never observe a torn
//! document. The version check runs under an OS-level exclusive lock on a
//! sibling lock file, so concurrent writers in different processes cannot
//! both pass the same version check. In-process change notification uses a
//! watch channel; other processes rely on polling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use seatdraft_core::{Snapshot, Version, VersionedSnapshot};
use tokio::fs;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use super::trait_::{Result, Store, StoreError};

/// Backoff while the lock file is held by another process.
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// File-backed JSON store.
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
    // Serializes the read-compare-write cycle within this process.
    write_lock: Mutex<()>,
    notify: watch::Sender<Version>,
}

impl JsonStore {
    /// Create a store at the given file path. Parent directories are
    /// created; the file itself is created on first persist.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let lock_path = path.with_extension("json.lock");
        let (notify, _) = watch::channel(0);
        Ok(Self {
            path,
            lock_path,
            write_lock: Mutex::new(()),
            notify,
        })
    }

    /// Take the exclusive advisory lock on the sibling lock file. Released
    /// when the returned handle drops, including on process death.
    async fn acquire_file_lock(&self) -> Result<std::fs::File> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        loop {
            match file.try_lock_exclusive() {
                Ok(true) => return Ok(file),
                Ok(false) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(LOCK_RETRY_DELAY).await;
        }
    }

    async fn read_document(&self) -> Result<VersionedSnapshot> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => {
                let state: VersionedSnapshot = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))?;
                Ok(state)
            }
            // Missing file reads as the empty initial state.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(VersionedSnapshot {
                version: 0,
                snapshot: Snapshot::empty(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn load(&self) -> Result<VersionedSnapshot> {
        self.read_document().await
    }

    async fn persist(&self, next: &Snapshot, expected: Version) -> Result<Version> {
        let _guard = self.write_lock.lock().await;
        // Held for the whole read-compare-rename cycle; dropped on return.
        let _file_lock = self.acquire_file_lock().await?;

        let current = self.read_document().await?;
        if current.version != expected {
            return Err(StoreError::Conflict { expected });
        }

        let state = VersionedSnapshot {
            version: expected + 1,
            snapshot: next.clone(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(version = state.version, path = %self.path.display(), "persisted snapshot");
        let _ = self.notify.send(state.version);
        Ok(state.version)
    }

    fn watch(&self) -> Option<watch::Receiver<Version>> {
        Some(self.notify.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use seatdraft_core::{Participant, ParticipantStatus, Round};

    fn snapshot_with_one_participant() -> Snapshot {
        Snapshot {
            participants: vec![Participant {
                id: 1,
                name: "Alice Chen".to_string(),
                rank: 1,
                status: ParticipantStatus::Selecting,
                needs_double_semester: true,
                round1_pick: None,
                round2_pick: None,
            }],
            schools: Vec::new(),
            round: Round::First,
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_version_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("state.json")).await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.version, 0);
        assert!(state.snapshot.participants.is_empty());
    }

    #[tokio::test]
    async fn round_trips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("state.json")).await.unwrap();

        let snapshot = snapshot_with_one_participant();
        let v = store.persist(&snapshot, 0).await.unwrap();
        assert_eq!(v, 1);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.snapshot, snapshot);
    }

    #[tokio::test]
    async fn stale_version_is_rejected_and_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("state.json")).await.unwrap();

        let snapshot = snapshot_with_one_participant();
        store.persist(&snapshot, 0).await.unwrap();

        let err = store.persist(&Snapshot::empty(), 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.snapshot, snapshot);
    }

    #[tokio::test]
    async fn stale_persist_from_second_instance_conflicts() {
        // Two instances on one file stand in for two processes: the version
        // check reads the file, not in-memory state, so the late writer
        // conflicts and the first write survives.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let first = JsonStore::new(&path).await.unwrap();
        let second = JsonStore::new(&path).await.unwrap();

        let snapshot = snapshot_with_one_participant();
        first.persist(&snapshot, 0).await.unwrap();

        let err = second.persist(&Snapshot::empty(), 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(second.load().await.unwrap().snapshot, snapshot);
    }

    #[tokio::test]
    async fn persist_waits_for_lock_held_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = Arc::new(JsonStore::new(&path).await.unwrap());

        // Hold the lock through a separate handle, as another process would.
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path.with_extension("json.lock"))
            .unwrap();
        assert!(lock.try_lock_exclusive().unwrap());

        let writer = Arc::clone(&store);
        let task = tokio::spawn(async move { writer.persist(&Snapshot::empty(), 0).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!task.is_finished());

        lock.unlock().unwrap();
        let version = task.await.unwrap().unwrap();
        assert_eq!(version, 1);
    }
}
