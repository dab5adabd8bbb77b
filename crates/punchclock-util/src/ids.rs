//! Strongly-typed identifiers for punchclock

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::PunchclockError;

/// Number of digits in an employee PIN
pub const PIN_LENGTH: usize = 4;

/// Unique identifier for an employee in the roster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| PunchclockError::internal(format!("invalid employee id '{}': {}", s, e)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EmployeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A four digit numeric PIN identifying an employee at the kiosk.
///
/// Construction validates the format, so any `Pin` value is well-formed.
/// `Debug` output is masked to keep PINs out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    pub fn new(pin: impl Into<String>) -> crate::Result<Self> {
        let pin = pin.into();
        if pin.len() != PIN_LENGTH || !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PunchclockError::invalid_pin(format!(
                "PIN must be exactly {} digits",
                PIN_LENGTH
            )));
        }
        Ok(Self(pin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl TryFrom<String> for Pin {
    type Error = PunchclockError;

    fn try_from(s: String) -> crate::Result<Self> {
        Self::new(s)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

/// Trim an employee name and reject empty ones.
///
/// The name is the attendance session key, so surrounding whitespace would
/// split one employee's records across two keys.
pub fn normalize_employee_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PunchclockError::invalid_name("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
