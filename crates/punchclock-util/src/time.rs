//! Time utilities for punchclock
//!
//! Attendance math is done on wall-clock time, since clock-in timestamps
//! are persisted and compared across restarts.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PUNCHCLOCK_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. Useful for
//! walking through a full working day without waiting for it.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-22 08:00:00`)
//!
//! Example:
//! ```bash
//! PUNCHCLOCK_MOCK_TIME="2025-12-22 08:00:00" cargo run -p punchclockd
//! ```

use chrono::{DateTime, Local};
#[cfg(debug_assertions)]
use chrono::{NaiveDateTime, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PUNCHCLOCK_MOCK_TIME";

/// Format accepted by `PUNCHCLOCK_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once at first use so
/// that mock time advances naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Whole minutes elapsed from `start` to `end`, rounded towards negative
/// infinity. A clock that stepped backwards yields a negative count.
pub fn whole_minutes_between(start: &DateTime<Local>, end: &DateTime<Local>) -> i64 {
    end.signed_duration_since(*start)
        .num_milliseconds()
        .div_euclid(60_000)
}

/// Format a DateTime as `HH:MM:SS` for the kiosk status line.
pub fn format_clock_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M:%S").to_string()
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a minute count as hours and minutes, e.g. `8h 05m`.
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.unsigned_abs();
    format!("{}{}h {:02}m", sign, abs / 60, abs % 60)
}
