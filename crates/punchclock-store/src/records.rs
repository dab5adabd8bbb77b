//! Stored attendance records

use chrono::{DateTime, Local};
use punchclock_api::AttendanceEvent;
use serde::{Deserialize, Serialize};

/// An attendance event as read back from the log, with store metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAttendanceEvent {
    /// Row ID, assigned by the store in append order
    pub id: i64,

    /// When the store accepted the record (may lag the punch on retries)
    pub recorded_at: DateTime<Local>,

    /// The record as written by the kiosk
    pub event: AttendanceEvent,
}
