use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::Display;

/// One of the four daily attendance checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    InAm,
    OutAm,
    InPm,
    OutPm,
}

impl Slot {
    /// Column name in the attendance table.
    pub fn column(self) -> &'static str {
        match self {
            Slot::InAm => "time_in_am",
            Slot::OutAm => "time_out_am",
            Slot::InPm => "time_in_pm",
            Slot::OutPm => "time_out_pm",
        }
    }

    pub fn action(self) -> AttendanceAction {
        match self {
            Slot::InAm => AttendanceAction::TimeInAm,
            Slot::OutAm => AttendanceAction::TimeOutAm,
            Slot::InPm => AttendanceAction::TimeInPm,
            Slot::OutPm => AttendanceAction::TimeOutPm,
        }
    }
}

/// User-facing action labels. Must match the feedback display verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AttendanceAction {
    #[strum(serialize = "Time In AM")]
    TimeInAm,
    #[strum(serialize = "Time Out AM")]
    TimeOutAm,
    #[strum(serialize = "Time In PM")]
    TimeInPm,
    #[strum(serialize = "Time Out PM")]
    TimeOutPm,
    #[strum(serialize = "Complete")]
    Complete,
}

/// Identifies a daily record: one per person per calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub person_id: String,
    pub date: NaiveDate,
}

impl RecordKey {
    pub fn new(person_id: impl Into<String>, date: NaiveDate) -> Self {
        Self { person_id: person_id.into(), date }
    }

    /// Composite document key, e.g. `user1_2025-03-03`.
    pub fn doc_key(&self) -> String {
        format!("{}_{}", self.person_id, self.date.format("%Y-%m-%d"))
    }
}

/// Daily time record for one person. Slots fill strictly in order;
/// a populated slot is never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub person_id: String,
    pub person_name: String,
    pub date: NaiveDate,
    pub time_in_am: Option<NaiveTime>,
    pub time_out_am: Option<NaiveTime>,
    pub time_in_pm: Option<NaiveTime>,
    pub time_out_pm: Option<NaiveTime>,
}

impl AttendanceRecord {
    pub fn new(
        person_id: impl Into<String>,
        person_name: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            person_id: person_id.into(),
            person_name: person_name.into(),
            date,
            time_in_am: None,
            time_out_am: None,
            time_in_pm: None,
            time_out_pm: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.person_id.clone(), self.date)
    }

    pub fn slot(&self, slot: Slot) -> Option<NaiveTime> {
        match slot {
            Slot::InAm => self.time_in_am,
            Slot::OutAm => self.time_out_am,
            Slot::InPm => self.time_in_pm,
            Slot::OutPm => self.time_out_pm,
        }
    }

    pub fn set_slot(&mut self, slot: Slot, time: NaiveTime) {
        match slot {
            Slot::InAm => self.time_in_am = Some(time),
            Slot::OutAm => self.time_out_am = Some(time),
            Slot::InPm => self.time_in_pm = Some(time),
            Slot::OutPm => self.time_out_pm = Some(time),
        }
    }

    /// First unfilled slot in daily order, or None once the record is complete.
    pub fn first_open_slot(&self) -> Option<Slot> {
        [Slot::InAm, Slot::OutAm, Slot::InPm, Slot::OutPm]
            .into_iter()
            .find(|s| self.slot(*s).is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.first_open_slot().is_none()
    }
}

/// A durability obligation produced by a successful slot transition and
/// consumed by the batch worker. The cache always reflects a mutation
/// before it is enqueued.
#[derive(Debug, Clone)]
pub enum PendingMutation {
    /// First scan of the day: full document write.
    Create(AttendanceRecord),
    /// Subsequent scan: single-field update.
    Patch {
        key: RecordKey,
        slot: Slot,
        time: NaiveTime,
    },
}

impl PendingMutation {
    pub fn key(&self) -> RecordKey {
        match self {
            PendingMutation::Create(record) => record.key(),
            PendingMutation::Patch { key, .. } => key.clone(),
        }
    }
}

/// Result of processing one scan, surfaced to the feedback display.
/// Expected failures (unregistered card, completed record) are values
/// here, never errors.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub success: bool,
    pub action: Option<AttendanceAction>,
    pub time: Option<String>,
    pub message: String,
    pub person_name: Option<String>,
}

impl ScanOutcome {
    pub fn unregistered() -> Self {
        Self {
            success: false,
            action: None,
            time: None,
            message: "Unregistered RFID card. Please contact administrator.".to_string(),
            person_name: None,
        }
    }

    pub fn complete(person_name: &str) -> Self {
        Self {
            success: false,
            action: Some(AttendanceAction::Complete),
            time: None,
            message: format!("{person_name}, you have completed your DTR for today."),
            person_name: Some(person_name.to_string()),
        }
    }
}

/// 12-hour clock format shown to users, e.g. `08:00 AM`.
pub fn format_display_time(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}
