//! Change notification: polling with optional push wake-ups.

use std::sync::Arc;
use std::time::Duration;

use seatdraft_core::Version;
use seatdraft_storage::Store;
use tokio::sync::watch;
use tracing::debug;

/// Baseline polling cadence. Push channels only shorten latency; polling
/// is what actually guarantees propagation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Subscribe to store changes.
///
/// Spawns a task that polls the store on `poll_interval` and forwards
/// version bumps. A store's push channel only sees writes made through the
/// same store instance, so it is never trusted on its own: when present it
/// wakes the poll loop early, nothing more. The task stops once every
/// receiver is dropped.
pub async fn changes(store: Arc<dyn Store>, poll_interval: Duration) -> watch::Receiver<Version> {
    let mut push = store.watch();
    // Seed from the current state so subscribers only hear about changes
    // made after they subscribed.
    let mut last = match store.load().await {
        Ok(state) => state.version,
        Err(e) => {
            debug!(error = %e, "initial load failed, assuming version 0");
            0
        }
    };
    let (tx, rx) = watch::channel(last);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            let mut push_gone = false;
            match push.as_mut() {
                Some(events) => {
                    tokio::select! {
                        _ = interval.tick() => {}
                        changed = events.changed() => {
                            if changed.is_err() {
                                push_gone = true;
                            }
                        }
                    }
                }
                None => {
                    interval.tick().await;
                }
            }
            if push_gone {
                push = None;
            }
            if tx.is_closed() {
                break;
            }
            match store.load().await {
                Ok(state) if state.version != last => {
                    last = state.version;
                    let _ = tx.send(last);
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "poll failed, will retry"),
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatdraft_core::{Snapshot, VersionedSnapshot};
    use seatdraft_storage::{JsonStore, MemoryStore, Result as StoreResult};

    // The memory store exposes a push channel; this wrapper hides it to
    // exercise pure polling.
    struct PollOnly(MemoryStore);

    #[async_trait::async_trait]
    impl Store for PollOnly {
        async fn load(&self) -> StoreResult<VersionedSnapshot> {
            self.0.load().await
        }
        async fn persist(&self, next: &Snapshot, expected: Version) -> StoreResult<Version> {
            self.0.persist(next, expected).await
        }
    }

    #[tokio::test]
    async fn push_channel_wakes_the_poll_loop_early() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        // An interval far longer than the timeout: only the push wake-up
        // can deliver this in time.
        let mut rx = changes(Arc::clone(&store), Duration::from_secs(60)).await;

        store.persist(&Snapshot::empty(), 0).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn polling_observes_version_bumps() {
        let store: Arc<dyn Store> = Arc::new(PollOnly(MemoryStore::new()));
        assert!(store.watch().is_none());

        let mut rx = changes(Arc::clone(&store), Duration::from_millis(10)).await;
        store.persist(&Snapshot::empty(), 0).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn observes_writes_from_another_store_instance() {
        // Separate store instances on the same file stand in for separate
        // processes: the observer's push channel never fires for the
        // writer's persist, so only polling can deliver this.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let writer = JsonStore::new(&path).await.unwrap();
        let observer: Arc<dyn Store> = Arc::new(JsonStore::new(&path).await.unwrap());

        let mut rx = changes(observer, Duration::from_millis(10)).await;
        writer.persist(&Snapshot::empty(), 0).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn no_notification_for_changes_before_subscribing() {
        let store: Arc<dyn Store> = Arc::new(PollOnly(MemoryStore::new()));
        store.persist(&Snapshot::empty(), 0).await.unwrap();

        let mut rx = changes(Arc::clone(&store), Duration::from_millis(10)).await;
        // Several poll cycles pass without a new write: silence.
        let waited = tokio::time::timeout(Duration::from_millis(100), rx.changed()).await;
        assert!(waited.is_err());

        store.persist(&Snapshot::empty(), 1).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), 2);
    }
}
