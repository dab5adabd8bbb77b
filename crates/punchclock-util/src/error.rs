//! Error types for punchclock

use thiserror::Error;

/// Core error type for punchclock operations
#[derive(Debug, Error)]
pub enum PunchclockError {
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Invalid employee name: {0}")]
    InvalidName(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PunchclockError {
    pub fn invalid_pin(msg: impl Into<String>) -> Self {
        Self::InvalidPin(msg.into())
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PunchclockError>;
