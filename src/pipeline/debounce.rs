use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Suppresses duplicate processing of the same card within a cooldown
/// window. Remembers only the single most recently processed card, not a
/// per-card table: a different card interleaved between repeats takes over
/// the remembered entry. This matches the deployed scanner behavior.
pub struct ScanDebouncer {
    cooldown: chrono::Duration,
    last: Mutex<Option<(String, DateTime<Local>)>>,
}

impl ScanDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: chrono::Duration::from_std(cooldown)
                .expect("cooldown duration out of range"),
            last: Mutex::new(None),
        }
    }

    /// Atomic check-and-set: returns false (and leaves the remembered pair
    /// untouched) iff this card was processed less than a cooldown ago.
    /// A suppressed scan does not refresh the window.
    pub fn should_process(&self, card_uid: &str, now: DateTime<Local>) -> bool {
        let mut last = self.last.lock().expect("debounce state poisoned");

        if let Some((uid, seen)) = last.as_ref() {
            if uid == card_uid && now - *seen < self.cooldown {
                return false;
            }
        }

        *last = Some((card_uid.to_string(), now));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 3, 8, 0, secs).unwrap()
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let debouncer = ScanDebouncer::new(Duration::from_secs(2));
        assert!(debouncer.should_process("ABCD1234", at(0)));
        assert!(!debouncer.should_process("ABCD1234", at(1)));
    }

    #[test]
    fn repeat_after_cooldown_passes() {
        let debouncer = ScanDebouncer::new(Duration::from_secs(2));
        assert!(debouncer.should_process("ABCD1234", at(0)));
        assert!(debouncer.should_process("ABCD1234", at(2)));
    }

    #[test]
    fn suppressed_scan_does_not_refresh_window() {
        let debouncer = ScanDebouncer::new(Duration::from_secs(2));
        assert!(debouncer.should_process("ABCD1234", at(0)));
        // rejected at t=1, so the window still dates from t=0
        assert!(!debouncer.should_process("ABCD1234", at(1)));
        assert!(debouncer.should_process("ABCD1234", at(2)));
    }

    #[test]
    fn different_card_passes_and_takes_over_entry() {
        let debouncer = ScanDebouncer::new(Duration::from_secs(2));
        assert!(debouncer.should_process("ABCD1234", at(0)));
        assert!(debouncer.should_process("11223344", at(1)));
        // single-entry semantics: the first card is no longer remembered
        assert!(debouncer.should_process("ABCD1234", at(1)));
    }
}
