use std::time::Duration;

use tracing::{debug, info, warn};

use crate::device::{CardReader, FeedbackSink};
use crate::model::ScanOutcome;
use crate::persist::PersistenceQueue;
use crate::utils::clock::Clock;

pub mod cache;
pub mod debounce;
pub mod directory;
pub mod state;

pub use cache::AttendanceCache;
pub use debounce::ScanDebouncer;
pub use directory::PersonDirectory;

/// The scan-to-state pipeline: debounce, person lookup, slot decision,
/// synchronous cache write, asynchronous persistence enqueue. Everything
/// on this path is in-memory work; store I/O happens only in the batch
/// worker on the other side of the queue.
pub struct Pipeline<C: Clock> {
    directory: PersonDirectory,
    cache: AttendanceCache,
    debouncer: ScanDebouncer,
    queue: PersistenceQueue,
    clock: C,
}

impl<C: Clock> Pipeline<C> {
    pub fn new(
        directory: PersonDirectory,
        cache: AttendanceCache,
        debouncer: ScanDebouncer,
        queue: PersistenceQueue,
        clock: C,
    ) -> Self {
        Self { directory, cache, debouncer, queue, clock }
    }

    /// Full intake for one raw scan. Returns None when the debouncer
    /// suppresses a duplicate read of the same card.
    pub fn handle_scan(&self, card_uid: &str) -> Option<ScanOutcome> {
        let card_uid = card_uid.trim().to_uppercase();
        let now = self.clock.now();

        if !self.debouncer.should_process(&card_uid, now) {
            return None;
        }

        Some(self.record_attendance(&card_uid))
    }

    /// Resolve the card, decide the next slot, apply to the cache and
    /// enqueue the durability obligation. The cache write happens before
    /// the enqueue so cache state is always ahead of (or equal to) the
    /// store.
    pub fn record_attendance(&self, card_uid: &str) -> ScanOutcome {
        // normalize again: this is also a public entry point for callers
        // that bypass the debouncer
        let card_uid = card_uid.trim().to_uppercase();
        let now = self.clock.now();

        let Some(person) = self.directory.lookup(&card_uid) else {
            return ScanOutcome::unregistered();
        };

        let existing = self.cache.get(&person.id, now.date_naive());
        let decision = state::decide(existing.as_ref(), person, now);

        if let Some(mutation) = decision.mutation {
            self.cache.apply(&mutation);
            self.queue.enqueue(mutation);
        }

        decision.outcome
    }

    pub fn cache(&self) -> &AttendanceCache {
        &self.cache
    }
}

/// Poll the reader, feed scans through the pipeline, and signal feedback.
/// Runs until the future is dropped (shutdown select in main).
pub async fn run_scan_loop<C, R, F>(
    pipeline: &Pipeline<C>,
    reader: &mut R,
    feedback: &F,
    poll_timeout: Duration,
) where
    C: Clock,
    R: CardReader,
    F: FeedbackSink,
{
    info!("Scanner ready - waiting for cards");

    loop {
        let card_uid = match reader.poll(poll_timeout).await {
            Ok(Some(uid)) => uid,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Card reader fault; retrying");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let started = std::time::Instant::now();
        match pipeline.handle_scan(&card_uid) {
            Some(outcome) => {
                info!(
                    card_uid = %card_uid,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    success = outcome.success,
                    "{}",
                    outcome.message
                );
                feedback.signal(outcome.success);
            }
            None => debug!(card_uid = %card_uid, "Duplicate scan suppressed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceAction, Person};
    use crate::persist::persistence_queue;
    use crate::utils::clock::ManualClock;
    use chrono::{Local, TimeZone};

    fn pipeline_with_clock() -> (Pipeline<ManualClock>, ManualClock, crate::persist::QueueDrain) {
        let clock = ManualClock::new(Local.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap());
        let (queue, drain) = persistence_queue();
        let directory = PersonDirectory::new([Person {
            id: "user1".to_string(),
            name: "Jane Doe".to_string(),
            card_uid: "ABCD1234".to_string(),
            department: None,
        }]);
        let pipeline = Pipeline::new(
            directory,
            AttendanceCache::new(100),
            ScanDebouncer::new(Duration::from_secs(2)),
            queue,
            clock.clone(),
        );
        (pipeline, clock, drain)
    }

    #[test]
    fn unregistered_card_fails_without_enqueue() {
        let (pipeline, _clock, mut drain) = pipeline_with_clock();

        let outcome = pipeline.record_attendance("12345678");

        assert!(!outcome.success);
        assert!(outcome.message.contains("Unregistered"));
        assert!(drain.is_empty());
    }

    #[test]
    fn scan_updates_cache_before_reader_sees_outcome() {
        let (pipeline, clock, _drain) = pipeline_with_clock();

        let outcome = pipeline.record_attendance("ABCD1234");
        assert!(outcome.success);
        assert_eq!(outcome.action, Some(AttendanceAction::TimeInAm));

        // read-your-writes without any store round-trip
        let date = clock.now().date_naive();
        let cached = pipeline.cache().get("user1", date).unwrap();
        assert!(cached.time_in_am.is_some());
    }

    #[test]
    fn debounced_repeat_is_suppressed_but_new_card_passes() {
        let (pipeline, clock, _drain) = pipeline_with_clock();

        assert!(pipeline.handle_scan("ABCD1234").is_some());
        clock.advance(chrono::Duration::seconds(1));
        assert!(pipeline.handle_scan("ABCD1234").is_none());
        // a different (even unregistered) card is processed normally
        assert!(pipeline.handle_scan("99999999").is_some());
    }

    #[test]
    fn scan_input_is_normalized() {
        let (pipeline, _clock, _drain) = pipeline_with_clock();

        let outcome = pipeline.handle_scan(" abcd1234 ").unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.person_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn direct_record_attendance_is_normalized_too() {
        let (pipeline, _clock, _drain) = pipeline_with_clock();

        let outcome = pipeline.record_attendance(" abcd1234 ");
        assert!(outcome.success);
        assert_eq!(outcome.person_name.as_deref(), Some("Jane Doe"));
    }
}
