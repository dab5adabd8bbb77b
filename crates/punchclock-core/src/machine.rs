//! Attendance state machine

use chrono::{DateTime, Local};
use punchclock_api::{AttendanceEvent, AttendanceStatus, EventType};
use punchclock_store::{CachedSessionSnapshot, SessionCache, StoreError};
use punchclock_util::whole_minutes_between;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    AttendanceError, AttendanceResult, AttendanceSession, AutoLogoutTimer, BreakDeductionPolicy,
    CoreEvent, EventWriter, LogoutDue, SessionState,
};

/// Drives one employee's attendance session on this device.
///
/// Every accepted punch submits exactly one record to the event writer,
/// mirrors the session into the cache and re-arms the auto-logout timer.
/// Rejected punches touch none of them.
pub struct AttendanceStateMachine {
    session: AttendanceSession,
    breaks: BreakDeductionPolicy,
    cache: Arc<dyn SessionCache>,
    writer: EventWriter,
    timer: AutoLogoutTimer,
    retain_on_logout: bool,
}

impl AttendanceStateMachine {
    /// Bind a machine to an employee, restoring their session from the cache.
    ///
    /// A corrupt snapshot is cleared and the session starts idle.
    pub fn resume(
        employee_name: &str,
        cache: Arc<dyn SessionCache>,
        writer: EventWriter,
        timer: AutoLogoutTimer,
        breaks: BreakDeductionPolicy,
    ) -> Self {
        let mut session = AttendanceSession::idle(employee_name);

        match cache.load(employee_name) {
            Ok(Some(snapshot)) => {
                session.state = SessionState::from_snapshot(&snapshot);
                info!(
                    employee = %employee_name,
                    status = %snapshot.status,
                    clock_in_at = %snapshot.clock_in_at,
                    "Session restored from cache"
                );
            }
            Ok(None) => {
                debug!(employee = %employee_name, "No cached session");
            }
            Err(StoreError::CacheCorruption(reason)) => {
                warn!(
                    employee = %employee_name,
                    reason = %reason,
                    "Cached session is corrupt, starting idle"
                );
                if let Err(e) = cache.clear(employee_name) {
                    warn!(employee = %employee_name, error = %e, "Failed to clear corrupt session cache");
                }
            }
            Err(e) => {
                warn!(
                    employee = %employee_name,
                    error = %e,
                    "Session cache unavailable, starting idle"
                );
            }
        }

        Self {
            session,
            breaks,
            cache,
            writer,
            timer,
            retain_on_logout: false,
        }
    }

    /// Keep the attendance session when the device logs out
    pub fn with_retain_on_logout(mut self, retain: bool) -> Self {
        self.retain_on_logout = retain;
        self
    }

    pub fn session(&self) -> &AttendanceSession {
        &self.session
    }

    pub fn employee_name(&self) -> &str {
        &self.session.employee_name
    }

    pub fn status(&self) -> AttendanceStatus {
        self.session.status()
    }

    /// Start a work session. Only valid while idle.
    pub fn clock_in(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        if !matches!(self.session.state, SessionState::Idle) {
            return Err(self.rejected(EventType::ClockIn));
        }

        self.writer
            .submit(AttendanceEvent::clock_in(self.employee_name(), now, comment))?;

        self.session.state = SessionState::ClockedIn { since: now };
        self.session.comment = comment.to_string();
        self.save_snapshot(now);
        self.timer.arm();

        info!(employee = %self.session.employee_name, at = %now, "Clocked in");

        Ok(CoreEvent::ClockedIn {
            employee_name: self.session.employee_name.clone(),
            at: now,
        })
    }

    /// Start a break. Only valid while clocked in; a break cannot be ended
    /// except by clocking out.
    pub fn start_break(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        let since = match self.session.state {
            SessionState::ClockedIn { since } => since,
            _ => return Err(self.rejected(EventType::Break)),
        };

        self.writer
            .submit(AttendanceEvent::break_started(self.employee_name(), now, comment))?;

        self.session.state = SessionState::OnBreak { since };
        self.session.comment = comment.to_string();
        self.save_snapshot(now);
        self.timer.arm();

        info!(employee = %self.session.employee_name, at = %now, "Break started");

        Ok(CoreEvent::BreakStarted {
            employee_name: self.session.employee_name.clone(),
            at: now,
        })
    }

    /// End the work session and record the net work time
    pub fn clock_out(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        let since = match self.session.state.clock_in_at() {
            Some(since) => since,
            None => return Err(self.rejected(EventType::ClockOut)),
        };

        let work_minutes = whole_minutes_between(&since, &now);
        let break_deduction = self.breaks.deduction(work_minutes);
        let net_work_minutes = work_minutes - break_deduction;

        if net_work_minutes <= 0 {
            warn!(
                employee = %self.session.employee_name,
                work_minutes,
                break_deduction,
                net_work_minutes,
                "Net work time is not positive"
            );
        }

        self.writer.submit(AttendanceEvent::clock_out(
            self.employee_name(),
            now,
            comment,
            net_work_minutes,
        ))?;

        self.session.state = SessionState::Idle;
        self.session.comment = comment.to_string();
        self.clear_snapshot();
        self.timer.arm();

        info!(
            employee = %self.session.employee_name,
            at = %now,
            work_minutes,
            break_deduction,
            net_work_minutes,
            "Clocked out"
        );

        Ok(CoreEvent::ClockedOut {
            employee_name: self.session.employee_name.clone(),
            at: now,
            work_minutes,
            break_deduction,
            net_work_minutes,
        })
    }

    /// Reset to idle and clear the cache. Always succeeds and may be repeated.
    pub fn auto_logout(&mut self) -> CoreEvent {
        self.timer.cancel();

        if !self.session.status().is_idle() {
            info!(
                employee = %self.session.employee_name,
                status = %self.session.status(),
                "Open session discarded by logout"
            );
        }
        self.session.state = SessionState::Idle;
        self.session.comment.clear();
        self.clear_snapshot();

        CoreEvent::LoggedOut {
            employee_name: self.session.employee_name.clone(),
            session_retained: false,
        }
    }

    /// End the device session, honoring the retain-on-logout setting
    pub fn logout(&mut self) -> CoreEvent {
        if !self.retain_on_logout {
            return self.auto_logout();
        }

        self.timer.cancel();
        debug!(
            employee = %self.session.employee_name,
            status = %self.session.status(),
            "Session retained across logout"
        );

        CoreEvent::LoggedOut {
            employee_name: self.session.employee_name.clone(),
            session_retained: true,
        }
    }

    /// Handle a timer firing. Firings of superseded arms are ignored.
    pub fn on_timer(&mut self, due: LogoutDue) -> Option<CoreEvent> {
        if !self.timer.acknowledge(due) {
            debug!(arm_id = due.arm_id, "Ignoring stale auto-logout");
            return None;
        }

        info!(employee = %self.session.employee_name, "Confirmation window elapsed");
        Some(self.logout())
    }

    /// Minutes since clock-in, for display only
    pub fn work_minutes_so_far(&self, now: DateTime<Local>) -> i64 {
        self.session
            .clock_in_at()
            .map(|since| whole_minutes_between(&since, &now))
            .unwrap_or(0)
    }

    fn rejected(&self, action: EventType) -> AttendanceError {
        let from = self.session.status();
        debug!(
            employee = %self.session.employee_name,
            from = %from,
            action = %action,
            "Transition rejected"
        );
        AttendanceError::InvalidTransition { from, action }
    }

    fn save_snapshot(&self, now: DateTime<Local>) {
        let Some(clock_in_at) = self.session.clock_in_at() else {
            return;
        };

        let snapshot = CachedSessionSnapshot {
            status: self.session.status(),
            clock_in_at,
            work_minutes: whole_minutes_between(&clock_in_at, &now),
        };
        if let Err(e) = self.cache.save(&self.session.employee_name, &snapshot) {
            warn!(employee = %self.session.employee_name, error = %e, "Failed to save session cache");
        }
    }

    fn clear_snapshot(&self) {
        if let Err(e) = self.cache.clear(&self.session.employee_name) {
            warn!(employee = %self.session.employee_name, error = %e, "Failed to clear session cache");
        }
    }
}
