//! Configuration parsing and validation for punchclock
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Kiosk settings (data directory, confirmation window, logout behavior)
//! - Durable write retry settings
//! - Break deduction tiers
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<KioskPolicy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the default policy.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<KioskPolicy> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(
            config_path = %path.display(),
            "No config file found, using defaults"
        );
        return Ok(KioskPolicy::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<KioskPolicy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(KioskPolicy::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let policy = parse_config("config_version = 1").unwrap();
        assert_eq!(policy.kiosk.confirmation_delay, Duration::from_millis(3000));
        assert_eq!(policy.break_rules, statutory_break_rules());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [kiosk]
            data_dir = "/tmp/punchclock-test"
            confirmation_delay_ms = 1500
            retain_session_on_logout = true

            [writer]
            max_attempts = 3
            initial_backoff_ms = 100
            max_backoff_ms = 400

            [[break_rules]]
            min_work_minutes = 300
            deduct_minutes = 15
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(
            policy.kiosk.data_dir,
            std::path::PathBuf::from("/tmp/punchclock-test")
        );
        assert_eq!(policy.kiosk.confirmation_delay, Duration::from_millis(1500));
        assert!(policy.kiosk.retain_session_on_logout);
        assert_eq!(policy.writer.max_attempts, 3);
        assert_eq!(policy.writer.max_backoff, Duration::from_millis(400));
        assert_eq!(policy.break_rules, vec![BreakRule::new(300, 15)]);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [kiosk]
            confirmation_delay_ms = 0
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(policy.writer, WriteRetryPolicy::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[kiosk]\nconfirmation_delay_ms = 2000").unwrap();

        let policy = load_config(file.path()).unwrap();
        assert_eq!(policy.kiosk.confirmation_delay, Duration::from_millis(2000));
    }
}
