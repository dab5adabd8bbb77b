//! SQLite-based store implementation

use chrono::{DateTime, Local};
use punchclock_api::{AttendanceEvent, AttendanceStatus, Employee};
use punchclock_util::{EmployeeId, Pin, normalize_employee_name};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    CachedSessionSnapshot, EventSink, Roster, SessionCache, StoreError, StoreResult,
    StoredAttendanceEvent,
};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Attendance log (append-only)
            CREATE TABLE IF NOT EXISTS attendance_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at TEXT NOT NULL,
                employee_name TEXT NOT NULL,
                status TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Session cache (one row per non-idle employee)
            CREATE TABLE IF NOT EXISTS session_cache (
                employee_name TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                clock_in_time TEXT NOT NULL,
                work_minutes INTEGER NOT NULL DEFAULT 0
            );

            -- Roster
            CREATE TABLE IF NOT EXISTS employees (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                pin TEXT NOT NULL UNIQUE
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_attendance_employee ON attendance_log(employee_name);
            -- Names key the session cache
            CREATE UNIQUE INDEX IF NOT EXISTS idx_employees_name ON employees(name);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    /// Most recent attendance records, newest first
    pub fn recent_events(&self, limit: usize) -> StoreResult<Vec<StoredAttendanceEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, recorded_at, event_json FROM attendance_log ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], read_event_row)?;
        collect_events(rows)
    }

    /// Most recent attendance records of one employee, newest first
    pub fn events_for(
        &self,
        employee_name: &str,
        limit: usize,
    ) -> StoreResult<Vec<StoredAttendanceEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, recorded_at, event_json FROM attendance_log
            WHERE employee_name = ?
            ORDER BY id DESC LIMIT ?
            "#,
        )?;
        let rows = stmt.query_map(params![employee_name, limit as i64], read_event_row)?;
        collect_events(rows)
    }

    /// Check if store is healthy
    pub fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }

    fn pin_owner(conn: &Connection, pin: &Pin) -> StoreResult<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT id FROM employees WHERE pin = ?",
                [pin.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn name_owner(conn: &Connection, name: &str) -> StoreResult<Option<String>> {
        Ok(conn
            .query_row("SELECT id FROM employees WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn employee_name(conn: &Connection, id: &EmployeeId) -> StoreResult<String> {
        conn.query_row(
            "SELECT name FROM employees WHERE id = ?",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("employee {}", id)))
    }
}

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn collect_events(
    rows: impl Iterator<Item = rusqlite::Result<(i64, String, String)>>,
) -> StoreResult<Vec<StoredAttendanceEvent>> {
    let mut events = Vec::new();
    for row in rows {
        let (id, recorded_at, event_json) = row?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|e| StoreError::Serialization(format!("recorded_at: {}", e)))?;
        let event: AttendanceEvent = serde_json::from_str(&event_json)?;
        events.push(StoredAttendanceEvent {
            id,
            recorded_at,
            event,
        });
    }
    Ok(events)
}

fn read_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn employee_from_row((id, name, pin): (String, String, String)) -> StoreResult<Employee> {
    Ok(Employee {
        id: EmployeeId::parse(&id)?,
        name,
        pin: Pin::new(pin)?,
    })
}

impl EventSink for SqliteStore {
    fn append(&self, event: &AttendanceEvent) -> StoreResult<i64> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(event)?;

        conn.execute(
            r#"
            INSERT INTO attendance_log (recorded_at, employee_name, status, event_json)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                punchclock_util::now().to_rfc3339(),
                event.employee_name,
                event.event_type.as_str(),
                event_json
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(
            record_id = id,
            employee = %event.employee_name,
            status = %event.event_type,
            "Attendance record appended"
        );
        Ok(id)
    }
}

impl SessionCache for SqliteStore {
    fn load(&self, employee_name: &str) -> StoreResult<Option<CachedSessionSnapshot>> {
        let conn = self.conn()?;

        let row: Option<(String, String, Value)> = conn
            .query_row(
                "SELECT status, clock_in_time, work_minutes FROM session_cache WHERE employee_name = ?",
                [employee_name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((status, clock_in_time, work_minutes)) = row else {
            return Ok(None);
        };

        let status: AttendanceStatus = status
            .parse()
            .map_err(|e: punchclock_api::ParseStatusError| StoreError::CacheCorruption(e.to_string()))?;
        if status.is_idle() {
            return Err(StoreError::CacheCorruption(
                "idle session has a cache snapshot".into(),
            ));
        }

        let clock_in_at = DateTime::parse_from_rfc3339(&clock_in_time)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|e| {
                StoreError::CacheCorruption(format!("clock-in time '{}': {}", clock_in_time, e))
            })?;

        let work_minutes = match work_minutes {
            Value::Integer(minutes) => minutes,
            Value::Null => 0,
            other => {
                return Err(StoreError::CacheCorruption(format!(
                    "work minute counter is not an integer: {:?}",
                    other
                )));
            }
        };

        Ok(Some(CachedSessionSnapshot {
            status,
            clock_in_at,
            work_minutes,
        }))
    }

    fn save(&self, employee_name: &str, snapshot: &CachedSessionSnapshot) -> StoreResult<()> {
        if snapshot.status.is_idle() {
            return Err(StoreError::Invalid(
                "idle sessions are not cached".into(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO session_cache (employee_name, status, clock_in_time, work_minutes)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(employee_name)
            DO UPDATE SET
                status = excluded.status,
                clock_in_time = excluded.clock_in_time,
                work_minutes = excluded.work_minutes
            "#,
            params![
                employee_name,
                snapshot.status.as_str(),
                snapshot.clock_in_at.to_rfc3339(),
                snapshot.work_minutes
            ],
        )?;

        debug!(employee = %employee_name, status = %snapshot.status, "Session snapshot saved");
        Ok(())
    }

    fn clear(&self, employee_name: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM session_cache WHERE employee_name = ?",
            [employee_name],
        )?;
        debug!(employee = %employee_name, "Session snapshot cleared");
        Ok(())
    }
}

impl Roster for SqliteStore {
    fn find_by_pin(&self, pin: &Pin) -> StoreResult<Option<Employee>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, pin FROM employees WHERE pin = ?",
                [pin.as_str()],
                read_employee,
            )
            .optional()?;

        row.map(employee_from_row).transpose()
    }

    fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, pin FROM employees ORDER BY name, id")?;
        let rows = stmt.query_map([], read_employee)?;

        let mut employees = Vec::new();
        for row in rows {
            employees.push(employee_from_row(row?)?);
        }
        Ok(employees)
    }

    fn add_employee(&self, name: &str, pin: Pin) -> StoreResult<Employee> {
        let name = normalize_employee_name(name)?;
        let conn = self.conn()?;

        if Self::pin_owner(&conn, &pin)?.is_some() {
            return Err(StoreError::Conflict("PIN is already assigned".into()));
        }
        if Self::name_owner(&conn, &name)?.is_some() {
            return Err(StoreError::Conflict(format!("name '{}' is already taken", name)));
        }

        let employee = Employee {
            id: EmployeeId::new(),
            name,
            pin,
        };
        conn.execute(
            "INSERT INTO employees (id, name, pin) VALUES (?, ?, ?)",
            params![employee.id.to_string(), employee.name, employee.pin.as_str()],
        )?;

        info!(employee_id = %employee.id, name = %employee.name, "Employee added");
        Ok(employee)
    }

    fn rename_employee(&self, id: &EmployeeId, name: &str) -> StoreResult<()> {
        let name = normalize_employee_name(name)?;
        let conn = self.conn()?;

        let old_name = Self::employee_name(&conn, id)?;
        match Self::name_owner(&conn, &name)? {
            Some(owner) if owner != id.to_string() => {
                return Err(StoreError::Conflict(format!("name '{}' is already taken", name)));
            }
            _ => {}
        }

        // The session cache is keyed by name, so an open session follows the rename
        let tx = conn.unchecked_transaction()?;
        if old_name != name {
            // Nobody owns the new name, so a snapshot under it is orphaned
            tx.execute("DELETE FROM session_cache WHERE employee_name = ?", [&name])?;
        }
        tx.execute(
            "UPDATE employees SET name = ? WHERE id = ?",
            params![name, id.to_string()],
        )?;
        let moved = tx.execute(
            "UPDATE session_cache SET employee_name = ? WHERE employee_name = ?",
            params![name, old_name],
        )?;
        tx.commit()?;

        info!(employee_id = %id, from = %old_name, name = %name, moved_session = moved > 0, "Employee renamed");
        Ok(())
    }

    fn remove_employee(&self, id: &EmployeeId) -> StoreResult<()> {
        let conn = self.conn()?;
        let name = Self::employee_name(&conn, id)?;

        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM employees WHERE id = ?", [id.to_string()])?;
        let cleared = tx.execute("DELETE FROM session_cache WHERE employee_name = ?", [&name])?;
        tx.commit()?;

        if cleared > 0 {
            warn!(employee_id = %id, name = %name, "Removed employee had an open session, discarded");
        }
        info!(employee_id = %id, name = %name, "Employee removed");
        Ok(())
    }

    fn reset_pin(&self, id: &EmployeeId, pin: Pin) -> StoreResult<()> {
        let conn = self.conn()?;

        match Self::pin_owner(&conn, &pin)? {
            Some(owner) if owner != id.to_string() => {
                return Err(StoreError::Conflict("PIN is already assigned".into()));
            }
            _ => {}
        }

        let changed = conn.execute(
            "UPDATE employees SET pin = ? WHERE id = ?",
            params![pin.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("employee {}", id)));
        }

        info!(employee_id = %id, "Employee PIN reset");
        Ok(())
    }
}
