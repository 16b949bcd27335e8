//! SQLite store backend.
//!
//! Keeps participants and schools as JSON rows plus an `app_state` key/value
//! table holding the round and the store version. A persist runs as one SQL
//! transaction whose version UPDATE doubles as the compare-and-swap guard,
//! so two racing writers cannot both commit against the same version.

use async_trait::async_trait;
use seatdraft_core::{Participant, Round, School, Snapshot, Version, VersionedSnapshot};
use sqlx::Row;
use tokio::sync::watch;
use tracing::debug;

use super::trait_::{Result, Store, StoreError};

/// SQLite store implementation.
pub struct SqliteStore {
    pool: sqlx::SqlitePool,
    notify: watch::Sender<Version>,
}

impl SqliteStore {
    /// Connect to the given database URL and initialize the schema.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = sqlx::SqlitePool::connect(url)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Self::from_pool(pool).await
    }

    /// Create an in-memory store for testing.
    pub async fn in_memory() -> Result<Self> {
        // A pooled in-memory database must stay on one connection or each
        // checkout would see a fresh empty database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: sqlx::SqlitePool) -> Result<Self> {
        let (notify, _) = watch::channel(0);
        let store = Self { pool, notify };
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY,
                rank INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schools (
                id INTEGER PRIMARY KEY,
                data TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.to_string()))?;

        sqlx::query("INSERT OR IGNORE INTO app_state (key, value) VALUES ('version', '0')")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        sqlx::query("INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_round', '1')")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;

        Ok(())
    }

    async fn read_state_value(&self, key: &str) -> Result<String> {
        let row = sqlx::query("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(row.try_get("value").unwrap_or_default())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn load(&self) -> Result<VersionedSnapshot> {
        let version: Version = self
            .read_state_value("version")
            .await?
            .parse()
            .map_err(|_| StoreError::Corrupt("non-numeric version".to_string()))?;

        let round_raw: u8 = self
            .read_state_value("current_round")
            .await?
            .parse()
            .map_err(|_| StoreError::Corrupt("non-numeric round".to_string()))?;
        let round = Round::try_from(round_raw).map_err(StoreError::Corrupt)?;

        let rows = sqlx::query("SELECT data FROM participants ORDER BY rank ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let participants: Vec<Participant> = rows
            .into_iter()
            .map(|row| {
                let data: String = row.try_get("data").unwrap_or_default();
                serde_json::from_str(&data).map_err(StoreError::Json)
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = sqlx::query("SELECT data FROM schools ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let schools: Vec<School> = rows
            .into_iter()
            .map(|row| {
                let data: String = row.try_get("data").unwrap_or_default();
                serde_json::from_str(&data).map_err(StoreError::Json)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionedSnapshot {
            version,
            snapshot: Snapshot {
                participants,
                schools,
                round,
            },
        })
    }

    async fn persist(&self, next: &Snapshot, expected: Version) -> Result<Version> {
        let new_version = expected + 1;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;

        // CAS guard: the UPDATE only matches when nobody persisted since
        // our read.
        let guard = sqlx::query("UPDATE app_state SET value = ? WHERE key = 'version' AND value = ?")
            .bind(new_version.to_string())
            .bind(expected.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        if guard.rows_affected() != 1 {
            return Err(StoreError::Conflict { expected });
        }

        sqlx::query("DELETE FROM participants")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        for participant in &next.participants {
            let data = serde_json::to_string(participant)?;
            sqlx::query("INSERT INTO participants (id, rank, data) VALUES (?, ?, ?)")
                .bind(participant.id)
                .bind(participant.rank as i64)
                .bind(data)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Other(e.to_string()))?;
        }

        sqlx::query("DELETE FROM schools")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        for school in &next.schools {
            let data = serde_json::to_string(school)?;
            sqlx::query("INSERT INTO schools (id, data) VALUES (?, ?)")
                .bind(school.id)
                .bind(data)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Other(e.to_string()))?;
        }

        sqlx::query("UPDATE app_state SET value = ? WHERE key = 'current_round'")
            .bind(u8::from(next.round).to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;

        debug!(version = new_version, "persisted snapshot");
        let _ = self.notify.send(new_version);
        Ok(new_version)
    }

    fn watch(&self) -> Option<watch::Receiver<Version>> {
        Some(self.notify.subscribe())
    }
}
