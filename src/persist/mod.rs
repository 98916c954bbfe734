use async_trait::async_trait;
use chrono::NaiveTime;
use thiserror::Error;

use crate::model::{AttendanceRecord, PendingMutation, RecordKey, Slot};

pub mod memory;
pub mod queue;
pub mod sqlite;
pub mod worker;

pub use memory::MemoryStore;
pub use queue::{Drained, PersistenceQueue, QueueDrain, persistence_queue};
pub use sqlite::SqliteStore;
pub use worker::BatchWorker;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document-style attendance store, addressed by `{person_id}_{date}`.
/// Commits happen only inside the batch worker, never on the scan path.
///
/// `update` against a key that does not exist yet upserts: it writes a row
/// carrying only the patched slot, so a lost create can never silently
/// drop a day's first scan.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Full document write (create, or overwrite on replay).
    async fn set(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Single-field update; upserts when the document is missing.
    async fn update(&self, key: &RecordKey, slot: Slot, time: NaiveTime)
    -> Result<(), StoreError>;

    /// Apply a batch of mutations as one atomic commit, in arrival order.
    async fn commit_batch(&self, ops: &[PendingMutation]) -> Result<(), StoreError>;
}
