use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::NaiveTime;

use crate::model::{AttendanceRecord, PendingMutation, RecordKey, Slot};
use crate::persist::{AttendanceStore, StoreError};

/// In-process store for offline simulation and tests. Mirrors the sqlite
/// backend's upsert-on-update behavior and records every batch commit so
/// tests can assert on flush boundaries.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, AttendanceRecord>>,
    commit_sizes: Mutex<Vec<usize>>,
    fail_commits: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, doc_key: &str) -> Option<AttendanceRecord> {
        self.docs.lock().expect("memory store poisoned").get(doc_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().expect("memory store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sizes of every committed batch, in commit order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commit_sizes.lock().expect("memory store poisoned").clone()
    }

    /// Make the next `n` batch commits fail with a transient error.
    pub fn fail_next_commits(&self, n: u32) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    fn upsert_slot(
        docs: &mut HashMap<String, AttendanceRecord>,
        key: &RecordKey,
        slot: Slot,
        time: NaiveTime,
    ) {
        let record = docs.entry(key.doc_key()).or_insert_with(|| {
            AttendanceRecord::new(key.person_id.clone(), "", key.date)
        });
        record.set_slot(slot, time);
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn set(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.docs
            .lock()
            .expect("memory store poisoned")
            .insert(record.key().doc_key(), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        key: &RecordKey,
        slot: Slot,
        time: NaiveTime,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("memory store poisoned");
        Self::upsert_slot(&mut docs, key, slot, time);
        Ok(())
    }

    async fn commit_batch(&self, ops: &[PendingMutation]) -> Result<(), StoreError> {
        let remaining = self.fail_commits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_commits.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        let mut docs = self.docs.lock().expect("memory store poisoned");
        for op in ops {
            match op {
                PendingMutation::Create(record) => {
                    docs.insert(record.key().doc_key(), record.clone());
                }
                PendingMutation::Patch { key, slot, time } => {
                    Self::upsert_slot(&mut docs, key, *slot, *time);
                }
            }
        }

        self.commit_sizes
            .lock()
            .expect("memory store poisoned")
            .push(ops.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[tokio::test]
    async fn update_on_missing_key_upserts() {
        let store = MemoryStore::new();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        store
            .update(&RecordKey::new("user1", date()), Slot::OutAm, noon)
            .await
            .unwrap();

        let record = store.get("user1_2025-03-03").unwrap();
        assert_eq!(record.time_out_am, Some(noon));
        assert!(record.time_in_am.is_none());
    }

    #[tokio::test]
    async fn batch_applies_in_arrival_order() {
        let store = MemoryStore::new();
        let mut record = AttendanceRecord::new("user1", "Jane Doe", date());
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        record.set_slot(Slot::InAm, eight);

        let ops = vec![
            PendingMutation::Create(record),
            PendingMutation::Patch {
                key: RecordKey::new("user1", date()),
                slot: Slot::OutAm,
                time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            },
        ];
        store.commit_batch(&ops).await.unwrap();

        let stored = store.get("user1_2025-03-03").unwrap();
        assert_eq!(stored.time_in_am, Some(eight));
        assert!(stored.time_out_am.is_some());
        assert_eq!(store.commit_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next_commits(1);

        let ops = vec![PendingMutation::Patch {
            key: RecordKey::new("user1", date()),
            slot: Slot::InAm,
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        }];

        assert!(store.commit_batch(&ops).await.is_err());
        assert!(store.commit_batch(&ops).await.is_ok());
        assert_eq!(store.commit_sizes(), vec![1]);
    }
}
