//! Validated policy structures

use crate::schema::{RawBreakRule, RawConfig, RawKioskConfig, RawWriterConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default confirmation window after a punch (matches the kiosk's success screen)
pub const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 3000;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
const DEFAULT_MAX_BACKOFF_MS: u64 = 5000;

/// Validated policy ready for use by the attendance core
#[derive(Debug, Clone)]
pub struct KioskPolicy {
    /// Device settings
    pub kiosk: KioskConfig,

    /// Durable write retry policy
    pub writer: WriteRetryPolicy,

    /// Break deduction tiers, in any order
    pub break_rules: Vec<BreakRule>,
}

impl KioskPolicy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let break_rules = raw
            .break_rules
            .map(|rules| rules.into_iter().map(BreakRule::from_raw).collect())
            .unwrap_or_else(statutory_break_rules);

        Self {
            kiosk: KioskConfig::from_raw(raw.kiosk),
            writer: WriteRetryPolicy::from_raw(raw.writer),
            break_rules,
        }
    }
}

impl Default for KioskPolicy {
    fn default() -> Self {
        Self {
            kiosk: KioskConfig::default(),
            writer: WriteRetryPolicy::default(),
            break_rules: statutory_break_rules(),
        }
    }
}

/// Kiosk device configuration
#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Delay of the auto-logout timer armed after every punch
    pub confirmation_delay: Duration,
    /// When true, logging out of the device leaves the attendance session
    /// (and its cache snapshot) in place for the next login.
    pub retain_session_on_logout: bool,
}

impl KioskConfig {
    fn from_raw(raw: RawKioskConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(punchclock_util::default_data_dir),
            log_dir: raw
                .log_dir
                .unwrap_or_else(punchclock_util::default_log_dir),
            confirmation_delay: Duration::from_millis(
                raw.confirmation_delay_ms
                    .unwrap_or(DEFAULT_CONFIRMATION_DELAY_MS),
            ),
            retain_session_on_logout: raw.retain_session_on_logout.unwrap_or(false),
        }
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self::from_raw(RawKioskConfig::default())
    }
}

/// Retry policy for appending attendance records to the durable sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRetryPolicy {
    /// Total attempts per record, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl WriteRetryPolicy {
    fn from_raw(raw: RawWriterConfig) -> Self {
        Self {
            max_attempts: raw.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            initial_backoff: Duration::from_millis(
                raw.initial_backoff_ms.unwrap_or(DEFAULT_INITIAL_BACKOFF_MS),
            ),
            max_backoff: Duration::from_millis(
                raw.max_backoff_ms.unwrap_or(DEFAULT_MAX_BACKOFF_MS),
            ),
        }
    }

    /// Delay before retry number `retry` (1-based): doubles each time,
    /// capped at `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl Default for WriteRetryPolicy {
    fn default() -> Self {
        Self::from_raw(RawWriterConfig::default())
    }
}

/// One break deduction tier: once `min_work_minutes` have been worked,
/// `deduct_minutes` are subtracted from the net work time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRule {
    pub min_work_minutes: i64,
    pub deduct_minutes: i64,
}

impl BreakRule {
    pub const fn new(min_work_minutes: i64, deduct_minutes: i64) -> Self {
        Self {
            min_work_minutes,
            deduct_minutes,
        }
    }

    fn from_raw(raw: RawBreakRule) -> Self {
        Self::new(raw.min_work_minutes, raw.deduct_minutes)
    }
}

/// Statutory tiers: 30 minutes after 6 hours, 45 minutes after 9 hours
pub fn statutory_break_rules() -> Vec<BreakRule> {
    vec![BreakRule::new(360, 30), BreakRule::new(540, 45)]
}
