//! punchclockd - the punchclock kiosk
//!
//! Runs the shared attendance terminal and the admin commands around it.
//! It wires together:
//! - Configuration loading
//! - Store initialization
//! - The event writer and the auto-logout timer channels
//! - The kiosk device session driven by stdin

mod admin;
mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use punchclock_api::AttendanceStatus;
use punchclock_config::{KioskPolicy, load_config_or_default};
use punchclock_core::{CoreEvent, EventWriter, Kiosk, LogoutDue};
use punchclock_store::SqliteStore;
use punchclock_util::{
    DATABASE_FILENAME, LOG_FILENAME, PUNCHCLOCK_CONFIG_ENV, PUNCHCLOCK_DATA_DIR_ENV,
    default_config_path, format_clock_time, format_datetime_full, format_minutes,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::input::KioskInput;

/// punchclockd - shared attendance terminal
#[derive(Parser, Debug)]
#[command(name = "punchclockd")]
#[command(about = "Attendance kiosk: clock in, take a break, clock out", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/punchclock/config.toml)
    #[arg(short, long, env = PUNCHCLOCK_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set PUNCHCLOCK_DATA_DIR env var).
    /// The kiosk log moves along into `<data-dir>/logs`.
    #[arg(short, long, env = PUNCHCLOCK_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the kiosk on this terminal (default)
    Kiosk,

    /// Manage the employee roster
    #[command(subcommand)]
    Employee(admin::EmployeeCommand),

    /// Print recent attendance records as JSON lines
    Log {
        /// Only records of this employee
        #[arg(long)]
        employee: Option<String>,

        /// Maximum number of records
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

impl Args {
    fn runs_kiosk(&self) -> bool {
        matches!(self.command, None | Some(Command::Kiosk))
    }
}

/// The kiosk owns the terminal, so it logs JSON lines to a file in the log
/// directory. Admin commands log to stderr.
fn init_logging(args: &Args, policy: &KioskPolicy) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if !args.runs_kiosk() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let log_dir = kiosk_log_dir(args, policy);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_path = log_dir.join(LOG_FILENAME);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

/// A data directory override takes the kiosk log with it
fn kiosk_log_dir(args: &Args, policy: &KioskPolicy) -> PathBuf {
    match &args.data_dir {
        Some(data_dir) => data_dir.join("logs"),
        None => policy.kiosk.log_dir.clone(),
    }
}

/// Open the database in the configured data directory
fn open_store(args: &Args, policy: &KioskPolicy) -> Result<Arc<SqliteStore>> {
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| policy.kiosk.data_dir.clone());

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(store))
}

/// The running kiosk
struct Service {
    kiosk: Kiosk,
    writer: EventWriter,
    timer_rx: mpsc::UnboundedReceiver<LogoutDue>,
    notify_rx: mpsc::UnboundedReceiver<CoreEvent>,
}

impl Service {
    fn new(policy: &KioskPolicy, store: Arc<SqliteStore>) -> Self {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let writer = EventWriter::spawn(store.clone(), policy.writer, notify_tx);
        let kiosk = Kiosk::new(policy, store.clone(), store, writer.clone(), timer_tx);

        info!(
            confirmation_ms = policy.kiosk.confirmation_delay.as_millis() as u64,
            retain_session_on_logout = policy.kiosk.retain_session_on_logout,
            break_rules = policy.break_rules.len(),
            "Kiosk initialized"
        );

        Self {
            kiosk,
            writer,
            timer_rx,
            notify_rx,
        }
    }

    async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        info!("Kiosk running");
        show_login_prompt();

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }

                line = lines.next_line() => {
                    match line.context("Failed to read from stdin")? {
                        Some(line) => {
                            if !self.handle_line(&line) {
                                break;
                            }
                        }
                        None => {
                            info!("Input closed, shutting down");
                            break;
                        }
                    }
                }

                Some(due) = self.timer_rx.recv() => {
                    if let Some(event) = self.kiosk.on_timer(due) {
                        show_event(&event);
                        show_login_prompt();
                    }
                }

                Some(event) = self.notify_rx.recv() => {
                    show_event(&event);
                }
            }
        }

        // An open session stays in the cache for the next start
        if let Some(machine) = self.kiosk.current() {
            info!(
                employee = %machine.employee_name(),
                status = %machine.status(),
                "Shutting down with an employee logged in"
            );
        }

        // Drain records still queued for the store
        if let Err(e) = self.writer.flush().await {
            warn!(error = %e, "Pending attendance records may be lost");
        }
        while let Ok(event) = self.notify_rx.try_recv() {
            show_event(&event);
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Returns false when the kiosk should stop
    fn handle_line(&mut self, line: &str) -> bool {
        let input = match KioskInput::parse(line, self.kiosk.is_logged_in()) {
            Ok(Some(input)) => input,
            Ok(None) => return true,
            Err(message) => {
                println!("{}", message);
                return true;
            }
        };

        let now = punchclock_util::now();
        let result = match input {
            KioskInput::Quit => return false,
            KioskInput::Pin(pin) => self.kiosk.login(&pin),
            KioskInput::ClockIn(comment) => self.kiosk.clock_in(&comment, now),
            KioskInput::Break(comment) => self.kiosk.start_break(&comment, now),
            KioskInput::ClockOut(comment) => self.kiosk.clock_out(&comment, now),
            KioskInput::Logout => self.kiosk.logout(),
            KioskInput::Status => {
                self.show_status(now);
                return true;
            }
        };

        match result {
            Ok(event) => {
                show_event(&event);
                match event {
                    CoreEvent::LoggedIn { .. } => self.show_status(now),
                    CoreEvent::LoggedOut { .. } => show_login_prompt(),
                    _ => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Kiosk action rejected");
                println!("✗ {}", e);
            }
        }
        true
    }

    fn show_status(&self, now: chrono::DateTime<chrono::Local>) {
        let Some(machine) = self.kiosk.current() else {
            show_login_prompt();
            return;
        };

        let session = machine.session();
        println!("{}: {}", session.employee_name, session.status().label());
        if let Some(since) = session.clock_in_at() {
            println!(
                "  since {} ({} so far)",
                format_clock_time(&since),
                format_minutes(machine.work_minutes_so_far(now))
            );
        }

        let actions = match session.status() {
            AttendanceStatus::Idle => "in [comment] | logout",
            AttendanceStatus::ClockedIn => "break [comment] | out [comment] | logout",
            AttendanceStatus::OnBreak => "out [comment] | logout",
        };
        println!("  {}", actions);
    }
}

fn show_login_prompt() {
    println!("PIN eingeben (4 Ziffern), 'quit' beendet:");
}

fn show_event(event: &CoreEvent) {
    match event {
        CoreEvent::LoggedIn { employee_name, .. } => {
            println!("Willkommen, {}", employee_name);
        }
        CoreEvent::ClockedIn { at, .. } => {
            println!("✓ Angemeldet um {}", format_clock_time(at));
        }
        CoreEvent::BreakStarted { at, .. } => {
            println!("✓ Pause ab {}", format_clock_time(at));
        }
        CoreEvent::ClockedOut {
            at,
            work_minutes,
            break_deduction,
            net_work_minutes,
            ..
        } => {
            println!("✓ Abgemeldet um {}", format_clock_time(at));
            println!(
                "  Arbeitszeit {} - Pause {} = {}",
                format_minutes(*work_minutes),
                format_minutes(*break_deduction),
                format_minutes(*net_work_minutes)
            );
        }
        CoreEvent::LoggedOut { employee_name, .. } => {
            println!("Auf Wiedersehen, {}", employee_name);
        }
        CoreEvent::PunchNotRecorded {
            employee_name,
            event_type,
            error,
            ..
        } => {
            error!(employee = %employee_name, status = %event_type, error = %error, "Punch not recorded");
            println!(
                "✗ Buchung '{}' für {} wurde NICHT gespeichert, bitte Verwaltung informieren",
                event_type, employee_name
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let policy = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    init_logging(&args, &policy)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        "punchclockd starting"
    );
    if punchclock_util::is_mock_time_active() {
        warn!(
            now = %format_datetime_full(&punchclock_util::now()),
            "Mock time is active, punches will carry the mocked clock"
        );
    }

    let store = open_store(&args, &policy)?;

    match &args.command {
        None | Some(Command::Kiosk) => Service::new(&policy, store).run().await,
        Some(Command::Employee(command)) => admin::run_employee_command(store.as_ref(), command),
        Some(Command::Log { employee, limit }) => {
            admin::print_log(store.as_ref(), employee.as_deref(), *limit)
        }
    }
}
