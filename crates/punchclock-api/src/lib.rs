//! Shared types for punchclock
//!
//! This crate defines the contract between the attendance core and its
//! collaborators:
//! - Attendance status and transition kinds
//! - The durable attendance record (wire format read by reporting tools)
//! - Roster entries

mod types;

pub use types::*;
