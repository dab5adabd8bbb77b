//! Attendance core for punchclock
//!
//! This crate contains:
//! - The attendance session state machine (Idle -> ClockedIn -> OnBreak -> Idle)
//! - Break deduction policy
//! - The auto-logout timer armed after every punch
//! - The background writer that appends attendance records durably
//! - The kiosk device session (PIN login, logout back to the login view)

mod breaks;
mod events;
mod kiosk;
mod machine;
mod session;
mod timer;
mod writer;

pub use breaks::*;
pub use events::*;
pub use kiosk::*;
pub use machine::*;
pub use session::*;
pub use timer::*;
pub use writer::*;

use punchclock_api::{AttendanceStatus, EventType};
use punchclock_store::StoreError;
use thiserror::Error;

/// Errors returned by attendance operations
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("cannot {} while {}", .action.verb(), .from)]
    InvalidTransition {
        from: AttendanceStatus,
        action: EventType,
    },

    #[error("attendance record could not be written: {0}")]
    WriteFailure(String),

    #[error("session cache corrupted: {0}")]
    CacheCorruption(String),

    #[error("no employee is logged in")]
    NotLoggedIn,

    #[error("{0} is already logged in")]
    AlreadyLoggedIn(String),

    #[error("invalid PIN: {0}")]
    InvalidPin(String),

    #[error("unknown PIN")]
    UnknownPin,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
