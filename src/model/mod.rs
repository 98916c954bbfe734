pub mod attendance;
pub mod person;

pub use attendance::{
    AttendanceAction, AttendanceRecord, PendingMutation, RecordKey, ScanOutcome, Slot,
    format_display_time,
};
pub use person::Person;
