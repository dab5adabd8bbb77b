//! Core events emitted by the attendance core

use chrono::{DateTime, Local};
use punchclock_api::{AttendanceStatus, EventType};

/// Events emitted by the state machine, the kiosk and the event writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// An employee logged in on the device
    LoggedIn {
        employee_name: String,
        status: AttendanceStatus,
    },

    /// Work session started
    ClockedIn {
        employee_name: String,
        at: DateTime<Local>,
    },

    /// Break started
    BreakStarted {
        employee_name: String,
        at: DateTime<Local>,
    },

    /// Work session ended
    ClockedOut {
        employee_name: String,
        at: DateTime<Local>,
        work_minutes: i64,
        break_deduction: i64,
        net_work_minutes: i64,
    },

    /// Device returned to the login view
    LoggedOut {
        employee_name: String,
        /// The attendance session was kept for the next login
        session_retained: bool,
    },

    /// A record could not be appended after all retries
    PunchNotRecorded {
        employee_name: String,
        event_type: EventType,
        attempts: u32,
        error: String,
    },
}
