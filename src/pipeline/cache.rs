use chrono::NaiveDate;
use moka::sync::Cache;

use crate::model::{AttendanceRecord, PendingMutation, RecordKey};

/// In-memory daily records, keyed by `{person_id}_{date}`. The single
/// authoritative source for reads: the scan loop consults and updates it
/// synchronously, and a failed or delayed store commit never invalidates
/// an entry. Entries live for the process lifetime (daily cardinality is
/// bounded); capacity is a safety cap, not an eviction policy.
pub struct AttendanceCache {
    records: Cache<String, AttendanceRecord>,
}

impl AttendanceCache {
    pub fn new(capacity: u64) -> Self {
        let records = Cache::builder().max_capacity(capacity).build();
        Self { records }
    }

    pub fn get(&self, person_id: &str, date: NaiveDate) -> Option<AttendanceRecord> {
        self.records.get(&RecordKey::new(person_id, date).doc_key())
    }

    /// Create the record if absent, or stamp the matching slot in place.
    /// Returns the post-mutation record.
    pub fn apply(&self, mutation: &PendingMutation) -> AttendanceRecord {
        match mutation {
            PendingMutation::Create(record) => {
                self.records.insert(record.key().doc_key(), record.clone());
                record.clone()
            }
            PendingMutation::Patch { key, slot, time } => {
                // A patch against a cold key only happens if the process
                // restarted mid-day; rebuild a skeleton rather than drop it.
                let mut record = self.records.get(&key.doc_key()).unwrap_or_else(|| {
                    AttendanceRecord::new(key.person_id.clone(), "", key.date)
                });
                record.set_slot(*slot, *time);
                self.records.insert(key.doc_key(), record.clone());
                record
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Slot;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn create_is_immediately_readable() {
        let cache = AttendanceCache::new(100);
        let mut record = AttendanceRecord::new("user1", "Jane Doe", date());
        record.set_slot(Slot::InAm, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        cache.apply(&PendingMutation::Create(record));

        let read = cache.get("user1", date()).unwrap();
        assert_eq!(read.person_name, "Jane Doe");
        assert!(read.time_in_am.is_some());
    }

    #[test]
    fn patch_mutates_single_slot_in_place() {
        let cache = AttendanceCache::new(100);
        let mut record = AttendanceRecord::new("user1", "Jane Doe", date());
        let morning = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        record.set_slot(Slot::InAm, morning);
        cache.apply(&PendingMutation::Create(record));

        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let updated = cache.apply(&PendingMutation::Patch {
            key: RecordKey::new("user1", date()),
            slot: Slot::OutAm,
            time: noon,
        });

        assert_eq!(updated.time_in_am, Some(morning));
        assert_eq!(updated.time_out_am, Some(noon));
        assert_eq!(cache.get("user1", date()).unwrap().time_out_am, Some(noon));
    }

    #[test]
    fn patch_on_cold_key_rebuilds_skeleton() {
        let cache = AttendanceCache::new(100);
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        let record = cache.apply(&PendingMutation::Patch {
            key: RecordKey::new("user1", date()),
            slot: Slot::OutAm,
            time: noon,
        });

        assert_eq!(record.person_id, "user1");
        assert_eq!(record.time_out_am, Some(noon));
        assert!(record.time_in_am.is_none());
    }
}
