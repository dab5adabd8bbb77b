//! Shared types for the punchclock API

use chrono::{DateTime, Local};
use punchclock_util::{EmployeeId, Pin};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Attendance status of one employee on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Idle,
    ClockedIn,
    OnBreak,
}

impl AttendanceStatus {
    /// Stable string form, shared by the session cache and the UI
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Idle => "idle",
            AttendanceStatus::ClockedIn => "clocked-in",
            AttendanceStatus::OnBreak => "on-break",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AttendanceStatus::Idle)
    }

    /// German kiosk label
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Idle => "Abgemeldet",
            AttendanceStatus::ClockedIn => "Angemeldet",
            AttendanceStatus::OnBreak => "In Pause",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown attendance status '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for AttendanceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AttendanceStatus::Idle),
            "clocked-in" => Ok(AttendanceStatus::ClockedIn),
            "on-break" => Ok(AttendanceStatus::OnBreak),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// The three employee-initiated attendance transitions.
///
/// Serialized as the `status` field of the durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "clocked-in")]
    ClockIn,
    #[serde(rename = "on-break")]
    Break,
    #[serde(rename = "clocked-out")]
    ClockOut,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ClockIn => "clocked-in",
            EventType::Break => "on-break",
            EventType::ClockOut => "clocked-out",
        }
    }

    /// The employee action producing this event, for messages
    pub fn verb(&self) -> &'static str {
        match self {
            EventType::ClockIn => "clock in",
            EventType::Break => "start a break",
            EventType::ClockOut => "clock out",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record per completed transition.
///
/// This is the durable wire format consumed by reporting and admin tools.
/// Exactly one of `time_in`, `time`, `time_out` is present, matching
/// `event_type`; `net_work_minutes` is present only on clock-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    #[serde(rename = "name")]
    pub employee_name: String,

    #[serde(rename = "status")]
    pub event_type: EventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in: Option<DateTime<Local>>,

    /// Start of a break
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Local>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<DateTime<Local>>,

    #[serde(default)]
    pub comment: String,

    #[serde(
        rename = "netWorkTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub net_work_minutes: Option<i64>,
}

impl AttendanceEvent {
    pub fn clock_in(employee_name: &str, at: DateTime<Local>, comment: &str) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            event_type: EventType::ClockIn,
            time_in: Some(at),
            time: None,
            time_out: None,
            comment: comment.to_string(),
            net_work_minutes: None,
        }
    }

    pub fn break_started(employee_name: &str, at: DateTime<Local>, comment: &str) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            event_type: EventType::Break,
            time_in: None,
            time: Some(at),
            time_out: None,
            comment: comment.to_string(),
            net_work_minutes: None,
        }
    }

    pub fn clock_out(
        employee_name: &str,
        at: DateTime<Local>,
        comment: &str,
        net_work_minutes: i64,
    ) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            event_type: EventType::ClockOut,
            time_in: None,
            time: None,
            time_out: Some(at),
            comment: comment.to_string(),
            net_work_minutes: Some(net_work_minutes),
        }
    }

    /// The moment this transition happened
    pub fn occurred_at(&self) -> Option<DateTime<Local>> {
        self.time_in.or(self.time).or(self.time_out)
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub pin: Pin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 22, h, m, 0).unwrap()
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            AttendanceStatus::Idle,
            AttendanceStatus::ClockedIn,
            AttendanceStatus::OnBreak,
        ] {
            assert_eq!(status.as_str().parse::<AttendanceStatus>().unwrap(), status);
        }
        assert!("clocked_in".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn clock_out_wire_format() {
        let event = AttendanceEvent::clock_out("Ben", at(14, 10), "", 340);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["name"], "Ben");
        assert_eq!(json["status"], "clocked-out");
        assert_eq!(json["netWorkTime"], 340);
        assert_eq!(json["comment"], "");
        assert!(json.get("timeOut").is_some());
        assert!(json.get("timeIn").is_none());
        assert!(json.get("time").is_none());
    }

    #[test]
    fn clock_in_wire_format_has_no_net_time() {
        let event = AttendanceEvent::clock_in("Anna", at(9, 0), "Frühschicht");
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "clocked-in");
        assert_eq!(json["comment"], "Frühschicht");
        assert!(json.get("timeIn").is_some());
        assert!(json.get("netWorkTime").is_none());
    }

    #[test]
    fn break_record_uses_time_field() {
        let event = AttendanceEvent::break_started("Cem", at(12, 0), "");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"time\":"));
        assert!(json.contains("\"on-break\""));
        assert_eq!(event.occurred_at(), Some(at(12, 0)));
    }
}
