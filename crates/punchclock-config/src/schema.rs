//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Kiosk device settings
    #[serde(default)]
    pub kiosk: RawKioskConfig,

    /// Durable write retry settings
    #[serde(default)]
    pub writer: RawWriterConfig,

    /// Break deduction tiers. Absent means the statutory 6h/9h tiers.
    #[serde(default)]
    pub break_rules: Option<Vec<RawBreakRule>>,
}

/// Kiosk-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawKioskConfig {
    /// Data directory for the attendance database
    pub data_dir: Option<PathBuf>,

    /// Log directory
    pub log_dir: Option<PathBuf>,

    /// Confirmation window after each punch before the device logs out
    pub confirmation_delay_ms: Option<u64>,

    /// Keep the attendance session when the device session ends
    pub retain_session_on_logout: Option<bool>,
}

/// Durable write retry settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWriterConfig {
    /// Total attempts per record, including the first
    pub max_attempts: Option<u32>,

    /// Delay before the first retry
    pub initial_backoff_ms: Option<u64>,

    /// Upper bound for the doubling backoff
    pub max_backoff_ms: Option<u64>,
}

/// One break deduction tier
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBreakRule {
    /// Lower bound (inclusive) of worked minutes for this tier
    pub min_work_minutes: i64,

    /// Minutes deducted once the bound is reached
    pub deduct_minutes: i64,
}
