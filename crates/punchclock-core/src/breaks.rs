//! Break deduction policy

use punchclock_config::{BreakRule, statutory_break_rules};

/// Maps elapsed work minutes to the minutes deducted for breaks.
///
/// The highest tier whose threshold has been reached applies. Thresholds are
/// inclusive: exactly 360 worked minutes already earns the 30 minute tier
/// under the statutory rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakDeductionPolicy {
    /// Sorted by ascending threshold
    rules: Vec<BreakRule>,
}

impl BreakDeductionPolicy {
    pub fn from_rules(rules: impl IntoIterator<Item = BreakRule>) -> Self {
        let mut rules: Vec<BreakRule> = rules.into_iter().collect();
        rules.sort_by_key(|r| r.min_work_minutes);
        Self { rules }
    }

    /// 30 minutes from 6 hours worked, 45 minutes from 9 hours
    pub fn statutory() -> Self {
        Self::from_rules(statutory_break_rules())
    }

    /// A policy that never deducts anything
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[BreakRule] {
        &self.rules
    }

    pub fn deduction(&self, work_minutes: i64) -> i64 {
        self.rules
            .iter()
            .rev()
            .find(|rule| work_minutes >= rule.min_work_minutes)
            .map(|rule| rule.deduct_minutes)
            .unwrap_or(0)
    }
}

impl Default for BreakDeductionPolicy {
    fn default() -> Self {
        Self::statutory()
    }
}
