//! Attendance session state

use chrono::{DateTime, Local};
use punchclock_api::AttendanceStatus;
use punchclock_store::CachedSessionSnapshot;

/// Where one employee's work session stands.
///
/// The clock-in time lives inside the non-idle variants, so an idle session
/// cannot carry one and a running session cannot lack one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ClockedIn { since: DateTime<Local> },
    OnBreak { since: DateTime<Local> },
}

impl SessionState {
    pub fn status(&self) -> AttendanceStatus {
        match self {
            SessionState::Idle => AttendanceStatus::Idle,
            SessionState::ClockedIn { .. } => AttendanceStatus::ClockedIn,
            SessionState::OnBreak { .. } => AttendanceStatus::OnBreak,
        }
    }

    /// When the running session was clocked in
    pub fn clock_in_at(&self) -> Option<DateTime<Local>> {
        match self {
            SessionState::Idle => None,
            SessionState::ClockedIn { since } | SessionState::OnBreak { since } => Some(*since),
        }
    }

    /// Rebuild state from a cache snapshot
    pub fn from_snapshot(snapshot: &CachedSessionSnapshot) -> Self {
        let since = snapshot.clock_in_at;
        match snapshot.status {
            AttendanceStatus::Idle => SessionState::Idle,
            AttendanceStatus::ClockedIn => SessionState::ClockedIn { since },
            AttendanceStatus::OnBreak => SessionState::OnBreak { since },
        }
    }
}

/// The attendance session of the employee logged in on this device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSession {
    pub employee_name: String,
    pub state: SessionState,
    /// Comment entered with the most recent punch
    pub comment: String,
}

impl AttendanceSession {
    pub fn idle(employee_name: impl Into<String>) -> Self {
        Self {
            employee_name: employee_name.into(),
            state: SessionState::Idle,
            comment: String::new(),
        }
    }

    pub fn status(&self) -> AttendanceStatus {
        self.state.status()
    }

    pub fn clock_in_at(&self) -> Option<DateTime<Local>> {
        self.state.clock_in_at()
    }
}
