//! Admin commands: roster management and the attendance log

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use punchclock_store::{Roster, SqliteStore};
use punchclock_util::{EmployeeId, Pin};

#[derive(Subcommand, Debug)]
pub enum EmployeeCommand {
    /// Add an employee
    Add {
        name: String,
        /// Four-digit PIN, unique across the roster
        pin: String,
    },

    /// List employees
    List,

    /// Change an employee's name
    Rename { id: String, name: String },

    /// Remove an employee (attendance records are kept)
    Remove { id: String },

    /// Assign a new PIN
    ResetPin { id: String, pin: String },
}

fn parse_id(id: &str) -> Result<EmployeeId> {
    EmployeeId::parse(id).with_context(|| format!("Invalid employee id '{}'", id))
}

fn parse_pin(pin: &str) -> Result<Pin> {
    Pin::new(pin).context("PINs are exactly four digits")
}

pub fn run_employee_command(roster: &dyn Roster, command: &EmployeeCommand) -> Result<()> {
    match command {
        EmployeeCommand::Add { name, pin } => {
            let employee = roster.add_employee(name, parse_pin(pin)?)?;
            println!("{}\t{}", employee.id, employee.name);
        }
        EmployeeCommand::List => {
            let employees = roster.list_employees()?;
            if employees.is_empty() {
                println!("(no employees)");
            }
            for employee in employees {
                println!("{}\t{}", employee.id, employee.name);
            }
        }
        EmployeeCommand::Rename { id, name } => {
            roster.rename_employee(&parse_id(id)?, name)?;
        }
        EmployeeCommand::Remove { id } => {
            roster.remove_employee(&parse_id(id)?)?;
        }
        EmployeeCommand::ResetPin { id, pin } => {
            roster.reset_pin(&parse_id(id)?, parse_pin(pin)?)?;
        }
    }
    Ok(())
}

/// Print attendance records, oldest first, one JSON object per line
pub fn print_log(store: &SqliteStore, employee: Option<&str>, limit: usize) -> Result<()> {
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let mut records = match employee {
        Some(name) => store.events_for(name, limit)?,
        None => store.recent_events(limit)?,
    };
    records.reverse();

    for record in records {
        println!("{}", serde_json::to_string(&record.event)?);
    }
    Ok(())
}
