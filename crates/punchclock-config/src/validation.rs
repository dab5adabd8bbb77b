//! Configuration validation

use crate::schema::{RawBreakRule, RawConfig, RawKioskConfig, RawWriterConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Longest confirmation window accepted. Anything longer leaves an unattended
/// kiosk logged in.
pub const MAX_CONFIRMATION_DELAY_MS: u64 = 60_000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("kiosk.confirmation_delay_ms must be between 1 and {max}, got {value}")]
    InvalidConfirmationDelay { value: u64, max: u64 },

    #[error("writer: {0}")]
    WriterError(String),

    #[error("break_rules[{index}]: {message}")]
    BreakRuleError { index: usize, message: String },

    #[error("Duplicate break rule threshold: {0} minutes")]
    DuplicateBreakThreshold(i64),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_kiosk(&config.kiosk));
    errors.extend(validate_writer(&config.writer));

    if let Some(rules) = &config.break_rules {
        errors.extend(validate_break_rules(rules));
    }

    errors
}

fn validate_kiosk(kiosk: &RawKioskConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(delay) = kiosk.confirmation_delay_ms
        && (delay == 0 || delay > MAX_CONFIRMATION_DELAY_MS)
    {
        errors.push(ValidationError::InvalidConfirmationDelay {
            value: delay,
            max: MAX_CONFIRMATION_DELAY_MS,
        });
    }

    errors
}

fn validate_writer(writer: &RawWriterConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if writer.max_attempts == Some(0) {
        errors.push(ValidationError::WriterError(
            "max_attempts must be at least 1".into(),
        ));
    }

    if writer.initial_backoff_ms == Some(0) {
        errors.push(ValidationError::WriterError(
            "initial_backoff_ms must be greater than 0".into(),
        ));
    }

    if let (Some(initial), Some(max)) = (writer.initial_backoff_ms, writer.max_backoff_ms)
        && max < initial
    {
        errors.push(ValidationError::WriterError(format!(
            "max_backoff_ms ({}) is smaller than initial_backoff_ms ({})",
            max, initial
        )));
    }

    errors
}

fn validate_break_rules(rules: &[RawBreakRule]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.min_work_minutes < 0 {
            errors.push(ValidationError::BreakRuleError {
                index,
                message: "min_work_minutes cannot be negative".into(),
            });
        }
        if rule.deduct_minutes < 0 {
            errors.push(ValidationError::BreakRuleError {
                index,
                message: "deduct_minutes cannot be negative".into(),
            });
        }
        if !seen.insert(rule.min_work_minutes) {
            errors.push(ValidationError::DuplicateBreakThreshold(rule.min_work_minutes));
        }
    }

    errors
}
