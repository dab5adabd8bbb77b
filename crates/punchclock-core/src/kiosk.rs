//! Kiosk device session
//!
//! One shared device, one employee at a time. An employee logs in with
//! their PIN, punches, and the device falls back to the login view when the
//! confirmation window elapses or the employee logs out.

use chrono::{DateTime, Local};
use punchclock_config::KioskPolicy;
use punchclock_store::{Roster, SessionCache};
use punchclock_util::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    AttendanceError, AttendanceResult, AttendanceStateMachine, AutoLogoutTimer,
    BreakDeductionPolicy, CoreEvent, EventWriter, LogoutDue,
};

pub struct Kiosk {
    roster: Arc<dyn Roster>,
    cache: Arc<dyn SessionCache>,
    writer: EventWriter,
    breaks: BreakDeductionPolicy,
    confirmation_delay: Duration,
    retain_on_logout: bool,
    timer_tx: mpsc::UnboundedSender<LogoutDue>,
    active: Option<AttendanceStateMachine>,
}

impl Kiosk {
    pub fn new(
        policy: &KioskPolicy,
        roster: Arc<dyn Roster>,
        cache: Arc<dyn SessionCache>,
        writer: EventWriter,
        timer_tx: mpsc::UnboundedSender<LogoutDue>,
    ) -> Self {
        Self {
            roster,
            cache,
            writer,
            breaks: BreakDeductionPolicy::from_rules(policy.break_rules.iter().copied()),
            confirmation_delay: policy.kiosk.confirmation_delay,
            retain_on_logout: policy.kiosk.retain_session_on_logout,
            timer_tx,
            active: None,
        }
    }

    /// Log an employee in by PIN and restore their session
    pub fn login(&mut self, pin: &str) -> AttendanceResult<CoreEvent> {
        if let Some(machine) = &self.active {
            return Err(AttendanceError::AlreadyLoggedIn(
                machine.employee_name().to_string(),
            ));
        }

        let pin = Pin::new(pin).map_err(|e| AttendanceError::InvalidPin(e.to_string()))?;
        let employee = match self.roster.find_by_pin(&pin)? {
            Some(employee) => employee,
            None => {
                info!("Login with unknown PIN");
                return Err(AttendanceError::UnknownPin);
            }
        };

        let machine = AttendanceStateMachine::resume(
            &employee.name,
            self.cache.clone(),
            self.writer.clone(),
            AutoLogoutTimer::new(self.confirmation_delay, self.timer_tx.clone()),
            self.breaks.clone(),
        )
        .with_retain_on_logout(self.retain_on_logout);

        let status = machine.status();
        info!(employee = %employee.name, status = %status, "Employee logged in");
        self.active = Some(machine);

        Ok(CoreEvent::LoggedIn {
            employee_name: employee.name,
            status,
        })
    }

    /// The logged-in employee's machine, if any
    pub fn current(&self) -> Option<&AttendanceStateMachine> {
        self.active.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.active.is_some()
    }

    pub fn clock_in(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        self.active_mut()?.clock_in(comment, now)
    }

    pub fn start_break(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        self.active_mut()?.start_break(comment, now)
    }

    pub fn clock_out(&mut self, comment: &str, now: DateTime<Local>) -> AttendanceResult<CoreEvent> {
        self.active_mut()?.clock_out(comment, now)
    }

    /// Explicit logout, same teardown as the timer
    pub fn logout(&mut self) -> AttendanceResult<CoreEvent> {
        let mut machine = self.active.take().ok_or(AttendanceError::NotLoggedIn)?;
        Ok(machine.logout())
    }

    /// Deliver a timer firing. Returns the logout event when the device
    /// went back to the login view.
    pub fn on_timer(&mut self, due: LogoutDue) -> Option<CoreEvent> {
        let Some(machine) = self.active.as_mut() else {
            debug!(arm_id = due.arm_id, "Auto-logout with nobody logged in");
            return None;
        };

        let event = machine.on_timer(due)?;
        self.active = None;
        Some(event)
    }

    fn active_mut(&mut self) -> AttendanceResult<&mut AttendanceStateMachine> {
        self.active.as_mut().ok_or(AttendanceError::NotLoggedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use punchclock_api::AttendanceStatus;
    use punchclock_store::SqliteStore;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    fn kiosk(
        policy: &KioskPolicy,
    ) -> (Kiosk, Arc<SqliteStore>, mpsc::UnboundedReceiver<LogoutDue>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.add_employee("Anna", Pin::new("1234").unwrap()).unwrap();
        store.add_employee("Ben", Pin::new("5678").unwrap()).unwrap();

        let (notify_tx, _notify_rx) = mpsc::unbounded_channel();
        let writer = EventWriter::spawn(store.clone(), policy.writer, notify_tx);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let kiosk = Kiosk::new(policy, store.clone(), store.clone(), writer, timer_tx);
        (kiosk, store, timer_rx)
    }

    #[tokio::test]
    async fn test_login_rejects_bad_pins() {
        let (mut kiosk, _store, _rx) = kiosk(&KioskPolicy::default());

        assert!(matches!(kiosk.login("12a4"), Err(AttendanceError::InvalidPin(_))));
        assert!(matches!(kiosk.login("123"), Err(AttendanceError::InvalidPin(_))));
        assert!(matches!(kiosk.login("0000"), Err(AttendanceError::UnknownPin)));
        assert!(!kiosk.is_logged_in());
    }

    #[tokio::test]
    async fn test_punch_requires_login() {
        let (mut kiosk, _store, _rx) = kiosk(&KioskPolicy::default());
        assert!(matches!(
            kiosk.clock_in("", at(9, 0)),
            Err(AttendanceError::NotLoggedIn)
        ));
        assert!(matches!(kiosk.logout(), Err(AttendanceError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_one_employee_at_a_time() {
        let (mut kiosk, _store, _rx) = kiosk(&KioskPolicy::default());

        let event = kiosk.login("1234").unwrap();
        assert_eq!(
            event,
            CoreEvent::LoggedIn {
                employee_name: "Anna".into(),
                status: AttendanceStatus::Idle
            }
        );
        assert!(matches!(
            kiosk.login("5678"),
            Err(AttendanceError::AlreadyLoggedIn(name)) if name == "Anna"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_punch_then_confirmation_returns_to_login() {
        let (mut kiosk, store, mut timer_rx) = kiosk(&KioskPolicy::default());

        kiosk.login("1234").unwrap();
        kiosk.clock_in("", at(9, 0)).unwrap();

        let due = timer_rx.recv().await.unwrap();
        assert!(matches!(
            kiosk.on_timer(due),
            Some(CoreEvent::LoggedOut { .. })
        ));
        assert!(!kiosk.is_logged_in());

        // Default logout discards the open session
        assert!(store.load("Anna").unwrap().is_none());
        let event = kiosk.login("1234").unwrap();
        assert!(matches!(
            event,
            CoreEvent::LoggedIn {
                status: AttendanceStatus::Idle,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retained_session_resumes_on_next_login() {
        let mut policy = KioskPolicy::default();
        policy.kiosk.retain_session_on_logout = true;
        let (mut kiosk, _store, mut timer_rx) = kiosk(&policy);

        kiosk.login("5678").unwrap();
        kiosk.clock_in("", at(8, 0)).unwrap();
        let due = timer_rx.recv().await.unwrap();
        kiosk.on_timer(due).unwrap();

        let event = kiosk.login("5678").unwrap();
        assert!(matches!(
            event,
            CoreEvent::LoggedIn {
                status: AttendanceStatus::ClockedIn,
                ..
            }
        ));

        let event = kiosk.clock_out("", at(14, 10)).unwrap();
        assert!(matches!(
            event,
            CoreEvent::ClockedOut {
                net_work_minutes: 340,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_pending_confirmation() {
        let (mut kiosk, _store, mut timer_rx) = kiosk(&KioskPolicy::default());

        kiosk.login("1234").unwrap();
        kiosk.clock_in("", at(9, 0)).unwrap();
        kiosk.logout().unwrap();

        kiosk.login("5678").unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Anna's timer was cancelled by the logout, Ben has not punched
        assert!(timer_rx.try_recv().is_err());
        assert!(kiosk.is_logged_in());
        assert_eq!(kiosk.current().unwrap().employee_name(), "Ben");
    }

    #[tokio::test]
    async fn test_configured_break_rules_apply() {
        let mut policy = KioskPolicy::default();
        policy.break_rules = vec![punchclock_config::BreakRule::new(60, 10)];
        let (mut kiosk, _store, _rx) = kiosk(&policy);

        kiosk.login("1234").unwrap();
        kiosk.clock_in("", at(9, 0)).unwrap();
        let event = kiosk.clock_out("", at(10, 30)).unwrap();
        assert!(matches!(
            event,
            CoreEvent::ClockedOut {
                work_minutes: 90,
                break_deduction: 10,
                net_work_minutes: 80,
                ..
            }
        ));
    }
}
