//! Store trait definitions

use chrono::{DateTime, Local};
use punchclock_api::{AttendanceEvent, AttendanceStatus, Employee};
use punchclock_util::{EmployeeId, Pin};

use crate::StoreResult;

/// Append-only sink for attendance records.
///
/// Records are never updated or deleted through this interface, and the
/// attendance core never reads them back.
pub trait EventSink: Send + Sync {
    /// Append one record, returning its store-assigned sequence number
    fn append(&self, event: &AttendanceEvent) -> StoreResult<i64>;
}

/// Per-employee mirror of the current session, used to survive a restart.
///
/// Keyed by employee name. A snapshot exists only while the employee's
/// session is not idle.
pub trait SessionCache: Send + Sync {
    /// Load the snapshot for an employee. Malformed contents are reported as
    /// [`crate::StoreError::CacheCorruption`].
    fn load(&self, employee_name: &str) -> StoreResult<Option<CachedSessionSnapshot>>;

    /// Store (or replace) the snapshot for an employee
    fn save(&self, employee_name: &str, snapshot: &CachedSessionSnapshot) -> StoreResult<()>;

    /// Remove the snapshot for an employee. Clearing an absent key is fine.
    fn clear(&self, employee_name: &str) -> StoreResult<()>;
}

/// Employee roster
pub trait Roster: Send + Sync {
    /// Resolve a PIN to an employee
    fn find_by_pin(&self, pin: &Pin) -> StoreResult<Option<Employee>>;

    /// List all employees, ordered by name
    fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Add an employee. Names and PINs must be unique across the roster.
    fn add_employee(&self, name: &str, pin: Pin) -> StoreResult<Employee>;

    /// Change an employee's name. An open session moves with it.
    fn rename_employee(&self, id: &EmployeeId, name: &str) -> StoreResult<()>;

    /// Remove an employee. Attendance records are kept, an open session is
    /// discarded.
    fn remove_employee(&self, id: &EmployeeId) -> StoreResult<()>;

    /// Assign a new PIN
    fn reset_pin(&self, id: &EmployeeId, pin: Pin) -> StoreResult<()>;
}

/// Cached copy of a non-idle attendance session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSessionSnapshot {
    /// Never `Idle`: idle sessions have no snapshot
    pub status: AttendanceStatus,

    /// When the session was clocked in
    pub clock_in_at: DateTime<Local>,

    /// Work minutes accumulated when the snapshot was taken (display only)
    pub work_minutes: i64,
}
