//! Config validation CLI tool
//!
//! Validates a punchclock configuration file and reports any errors.

use punchclock_util::{default_config_path, format_minutes};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a punchclock configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match punchclock_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", punchclock_config::CURRENT_CONFIG_VERSION);
            println!("  Data dir: {}", policy.kiosk.data_dir.display());
            println!(
                "  Confirmation window: {} ms",
                policy.kiosk.confirmation_delay.as_millis()
            );
            println!(
                "  Retain session on logout: {}",
                policy.kiosk.retain_session_on_logout
            );
            println!(
                "  Write retries: {} attempts, backoff {}..{} ms",
                policy.writer.max_attempts,
                policy.writer.initial_backoff.as_millis(),
                policy.writer.max_backoff.as_millis()
            );

            let mut rules = policy.break_rules.clone();
            rules.sort_by_key(|r| r.min_work_minutes);
            println!();
            println!("Break deductions:");
            if rules.is_empty() {
                println!("  (none)");
            }
            for rule in rules {
                println!(
                    "  - from {} worked: {} min",
                    format_minutes(rule.min_work_minutes),
                    rule.deduct_minutes
                );
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                punchclock_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                punchclock_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                punchclock_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                punchclock_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        punchclock_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
