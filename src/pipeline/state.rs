use chrono::{DateTime, Local};

use crate::model::{
    AttendanceRecord, PendingMutation, Person, ScanOutcome, Slot, format_display_time,
};

/// What a scan decided: the outcome for the feedback display plus the
/// durability obligation, if any. A completed record produces no mutation.
pub struct Decision {
    pub outcome: ScanOutcome,
    pub mutation: Option<PendingMutation>,
}

/// Pure slot state machine. Strict daily progression
/// in-AM -> out-AM -> in-PM -> out-PM; the first scan of a day always
/// opens the record with Time In AM, and a fifth scan is an idempotent
/// "Complete" failure with no side effects.
pub fn decide(
    existing: Option<&AttendanceRecord>,
    person: &Person,
    now: DateTime<Local>,
) -> Decision {
    let time = now.time();
    let display = format_display_time(time);

    let Some(record) = existing else {
        let mut record = AttendanceRecord::new(&person.id, &person.name, now.date_naive());
        record.set_slot(Slot::InAm, time);

        return Decision {
            outcome: success_outcome(Slot::InAm, &person.name, &display),
            mutation: Some(PendingMutation::Create(record)),
        };
    };

    match record.first_open_slot() {
        Some(slot) => Decision {
            outcome: success_outcome(slot, &person.name, &display),
            mutation: Some(PendingMutation::Patch {
                key: record.key(),
                slot,
                time,
            }),
        },
        None => Decision {
            outcome: ScanOutcome::complete(&person.name),
            mutation: None,
        },
    }
}

fn success_outcome(slot: Slot, name: &str, time: &str) -> ScanOutcome {
    let message = match slot {
        Slot::InAm => format!("Welcome {name}! Time In AM recorded at {time}"),
        Slot::OutAm => format!("Goodbye {name}! Time Out AM recorded at {time}"),
        Slot::InPm => format!("Welcome back {name}! Time In PM recorded at {time}"),
        Slot::OutPm => {
            format!("Goodbye {name}! Time Out PM recorded at {time}. See you tomorrow!")
        }
    };

    ScanOutcome {
        success: true,
        action: Some(slot.action()),
        time: Some(time.to_string()),
        message,
        person_name: Some(name.to_string()),
    }
}
