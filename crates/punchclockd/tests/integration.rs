//! Integration tests for punchclockd
//!
//! These tests drive the kiosk end to end against a file-backed store.

use chrono::{DateTime, Local, TimeZone};
use punchclock_api::{AttendanceStatus, EventType};
use punchclock_config::{KioskPolicy, parse_config};
use punchclock_core::{AttendanceError, CoreEvent, EventWriter, Kiosk, LogoutDue};
use punchclock_store::{Roster, SessionCache, SqliteStore};
use punchclock_util::{DATABASE_FILENAME, Pin};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
}

struct Device {
    store: Arc<SqliteStore>,
    writer: EventWriter,
    kiosk: Kiosk,
    timer_rx: mpsc::UnboundedReceiver<LogoutDue>,
    notify_rx: mpsc::UnboundedReceiver<CoreEvent>,
}

impl Device {
    fn boot(data_dir: &Path, policy: &KioskPolicy) -> Self {
        let store = Arc::new(SqliteStore::open(data_dir.join(DATABASE_FILENAME)).unwrap());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let writer = EventWriter::spawn(store.clone(), policy.writer, notify_tx);
        let kiosk = Kiosk::new(policy, store.clone(), store.clone(), writer.clone(), timer_tx);
        Self {
            store,
            writer,
            kiosk,
            timer_rx,
            notify_rx,
        }
    }

    async fn wait_for_logout(&mut self) -> CoreEvent {
        loop {
            let due = self.timer_rx.recv().await.unwrap();
            if let Some(event) = self.kiosk.on_timer(due) {
                return event;
            }
        }
    }
}

fn seed_roster(data_dir: &Path) {
    let store = SqliteStore::open(data_dir.join(DATABASE_FILENAME)).unwrap();
    store.add_employee("Anna", Pin::new("1111").unwrap()).unwrap();
    store.add_employee("Ben", Pin::new("2222").unwrap()).unwrap();
    store.add_employee("Cem", Pin::new("3333").unwrap()).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_three_employees_one_device() {
    let dir = tempfile::tempdir().unwrap();
    seed_roster(dir.path());

    let mut policy = KioskPolicy::default();
    policy.kiosk.retain_session_on_logout = true;
    let mut device = Device::boot(dir.path(), &policy);

    let days = [
        ("1111", "Anna", at(9, 0), at(14, 30), 330),
        ("2222", "Ben", at(8, 0), at(14, 10), 340),
        ("3333", "Cem", at(7, 0), at(16, 5), 500),
    ];

    for (pin, _, start, _, _) in &days {
        device.kiosk.login(pin).unwrap();
        device.kiosk.clock_in("", *start).unwrap();
        device.wait_for_logout().await;
    }

    // Each employee has their own cache entry
    for (_, name, start, _, _) in &days {
        let cached = device.store.load(name).unwrap().unwrap();
        assert_eq!(cached.status, AttendanceStatus::ClockedIn);
        assert_eq!(cached.clock_in_at, *start);
    }

    for (pin, name, _, end, net) in &days {
        device.kiosk.login(pin).unwrap();
        let event = device.kiosk.clock_out("", *end).unwrap();
        match event {
            CoreEvent::ClockedOut {
                employee_name,
                net_work_minutes,
                ..
            } => {
                assert_eq!(&employee_name, name);
                assert_eq!(net_work_minutes, *net);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        device.wait_for_logout().await;
        assert!(device.store.load(name).unwrap().is_none());
    }

    device.writer.flush().await.unwrap();
    for (_, name, _, end, net) in &days {
        let records = device.store.events_for(name, 10).unwrap();
        assert_eq!(records.len(), 2);
        let last = &records[0].event;
        assert_eq!(last.event_type, EventType::ClockOut);
        assert_eq!(last.time_out, Some(*end));
        assert_eq!(last.net_work_minutes, Some(*net));
    }
    assert!(device.notify_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_default_logout_discards_open_session() {
    let dir = tempfile::tempdir().unwrap();
    seed_roster(dir.path());
    let mut device = Device::boot(dir.path(), &KioskPolicy::default());

    device.kiosk.login("1111").unwrap();
    device.kiosk.clock_in("", at(9, 0)).unwrap();
    let event = device.wait_for_logout().await;
    assert_eq!(
        event,
        CoreEvent::LoggedOut {
            employee_name: "Anna".into(),
            session_retained: false,
        }
    );

    assert!(device.store.load("Anna").unwrap().is_none());
    assert!(matches!(
        device.kiosk.clock_out("", at(17, 0)),
        Err(AttendanceError::NotLoggedIn)
    ));

    device.kiosk.login("1111").unwrap();
    assert!(matches!(
        device.kiosk.clock_out("", at(17, 0)),
        Err(AttendanceError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_restart_restores_open_session() {
    let dir = tempfile::tempdir().unwrap();
    seed_roster(dir.path());

    let policy = parse_config(
        r#"
        config_version = 1

        [kiosk]
        retain_session_on_logout = true
        "#,
    )
    .unwrap();

    {
        let mut device = Device::boot(dir.path(), &policy);
        device.kiosk.login("2222").unwrap();
        device.kiosk.clock_in("", at(8, 0)).unwrap();
        device.kiosk.start_break("Mittag", at(12, 0)).unwrap();
        device.writer.flush().await.unwrap();
    }

    let mut device = Device::boot(dir.path(), &policy);
    let event = device.kiosk.login("2222").unwrap();
    assert_eq!(
        event,
        CoreEvent::LoggedIn {
            employee_name: "Ben".into(),
            status: AttendanceStatus::OnBreak,
        }
    );
    let machine = device.kiosk.current().unwrap();
    assert_eq!(machine.session().clock_in_at(), Some(at(8, 0)));

    // Breaks end only by clocking out
    assert!(matches!(
        device.kiosk.clock_in("", at(12, 30)),
        Err(AttendanceError::InvalidTransition { .. })
    ));
    device.kiosk.clock_out("", at(14, 10)).unwrap();
    device.writer.flush().await.unwrap();

    let types: Vec<_> = device
        .store
        .events_for("Ben", 10)
        .unwrap()
        .into_iter()
        .rev()
        .map(|r| r.event.event_type)
        .collect();
    assert_eq!(
        types,
        vec![EventType::ClockIn, EventType::Break, EventType::ClockOut]
    );
}

#[tokio::test]
async fn test_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    seed_roster(dir.path());
    let mut device = Device::boot(dir.path(), &KioskPolicy::default());

    device.kiosk.login("1111").unwrap();
    device.kiosk.clock_in("Frühschicht", at(9, 0)).unwrap();
    device.kiosk.clock_out("", at(14, 30)).unwrap();
    device.writer.flush().await.unwrap();

    let records = device.store.events_for("Anna", 10).unwrap();
    let clock_out = serde_json::to_value(&records[0].event).unwrap();
    let clock_in = serde_json::to_value(&records[1].event).unwrap();

    assert_eq!(clock_in["name"], "Anna");
    assert_eq!(clock_in["status"], "clocked-in");
    assert_eq!(clock_in["comment"], "Frühschicht");
    assert!(clock_in.get("timeIn").is_some());
    assert!(clock_in.get("netWorkTime").is_none());

    assert_eq!(clock_out["status"], "clocked-out");
    assert_eq!(clock_out["netWorkTime"], 330);
    assert!(clock_out.get("timeOut").is_some());
    assert!(clock_out.get("timeIn").is_none());
}

#[tokio::test]
async fn test_roster_changes_apply_to_login() {
    let dir = tempfile::tempdir().unwrap();
    seed_roster(dir.path());
    let mut device = Device::boot(dir.path(), &KioskPolicy::default());

    let anna = device
        .store
        .list_employees()
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Anna")
        .unwrap();
    device
        .store
        .reset_pin(&anna.id, Pin::new("9090").unwrap())
        .unwrap();

    assert!(matches!(
        device.kiosk.login("1111"),
        Err(AttendanceError::UnknownPin)
    ));
    assert!(device.kiosk.login("9090").is_ok());
}
