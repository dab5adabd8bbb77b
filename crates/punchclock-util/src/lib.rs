//! Shared utilities for punchclock
//!
//! This crate provides:
//! - ID types (EmployeeId) and the validated `Pin` credential
//! - Time utilities (mockable wall clock, whole-minute arithmetic, formatting)
//! - Error types
//! - Default paths for config, data, and log directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
