//! Context budget monitoring for a growing message log.
//!
//! [`ContextBudget`] holds the ceiling and thresholds; [`ContextBudget::check`]
//! turns a measured unit count into a [`ContextUsage`] with a derived
//! [`ContextStatus`]. The status is never stored on its own: it is always
//! recomputed from `(used, budget)`.
//!
//! | ratio            | status              |
//! |------------------|---------------------|
//! | `< warn`         | `ok`                |
//! | `< compact`      | `warn`              |
//! | `< emergency`    | `compact`           |
//! | `>= emergency`   | `emergency_compact` |

use serde::{Deserialize, Serialize};

/// Default budget in estimated tokens.
pub const DEFAULT_BUDGET_UNITS: usize = 24_000;

/// What the driver should do about context growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    Ok,
    /// Non-blocking advisory for the next generation
    Warn,
    /// Summarize older messages in the working window
    Compact,
    /// Keep only the most recent messages plus a summary
    EmergencyCompact,
}

impl ContextStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStatus::Ok => "ok",
            ContextStatus::Warn => "warn",
            ContextStatus::Compact => "compact",
            ContextStatus::EmergencyCompact => "emergency_compact",
        }
    }

    pub fn needs_compaction(&self) -> bool {
        matches!(self, ContextStatus::Compact | ContextStatus::EmergencyCompact)
    }
}

impl std::fmt::Display for ContextStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage ratios at which each status starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetThresholds {
    pub warn: f64,
    pub compact: f64,
    pub emergency: f64,
}

impl Default for BudgetThresholds {
    fn default() -> Self {
        Self {
            warn: 0.70,
            compact: 0.85,
            emergency: 0.95,
        }
    }
}

impl BudgetThresholds {
    /// Status for a usage ratio.
    pub fn status_for(&self, ratio: f64) -> ContextStatus {
        if ratio >= self.emergency {
            ContextStatus::EmergencyCompact
        } else if ratio >= self.compact {
            ContextStatus::Compact
        } else if ratio >= self.warn {
            ContextStatus::Warn
        } else {
            ContextStatus::Ok
        }
    }

    /// Thresholds must be strictly increasing within `(0, 1]`.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (name, value) in [
            ("warn", self.warn),
            ("compact", self.compact),
            ("emergency", self.emergency),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                issues.push(format!(
                    "context_budget: {} ratio ({}) must be within (0, 1]",
                    name, value
                ));
            }
        }
        if !(self.warn < self.compact && self.compact < self.emergency) {
            issues.push(format!(
                "context_budget: ratios must be strictly increasing (warn {} < compact {} < emergency {})",
                self.warn, self.compact, self.emergency
            ));
        }
        issues
    }
}

/// A point-in-time measurement of context consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextUsage {
    pub used_units: usize,
    pub budget_units: usize,
    pub ratio: f64,
    pub status: ContextStatus,
}

impl ContextUsage {
    /// Measure `used` against `budget`. A zero budget is always an emergency.
    pub fn measure(used: usize, budget: usize, thresholds: &BudgetThresholds) -> Self {
        if budget == 0 {
            return Self {
                used_units: used,
                budget_units: 0,
                ratio: 1.0,
                status: ContextStatus::EmergencyCompact,
            };
        }
        let ratio = used as f64 / budget as f64;
        Self {
            used_units: used,
            budget_units: budget,
            ratio,
            status: thresholds.status_for(ratio),
        }
    }

    pub fn percent(&self) -> u32 {
        (self.ratio * 100.0).round() as u32
    }

    /// Human-readable message for this measurement.
    pub fn message(&self) -> String {
        let pct = self.percent();
        match self.status {
            ContextStatus::Ok => format!("Context usage is {}% of the budget.", pct),
            ContextStatus::Warn => format!(
                "Context is {}% full. Keep your contribution concise and do not repeat points already made.",
                pct
            ),
            ContextStatus::Compact => format!(
                "Context is {}% full. Older messages have been condensed into a summary.",
                pct
            ),
            ContextStatus::EmergencyCompact => format!(
                "Context is {}% full. Only the most recent messages are kept verbatim.",
                pct
            ),
        }
    }

    /// Advisory to append to the next generation's instructions, if any.
    pub fn advisory(&self) -> Option<String> {
        match self.status {
            ContextStatus::Ok => None,
            _ => Some(self.message()),
        }
    }
}

/// Budget controlling how much of the working window may be sent per call.
///
/// - `budget_units`: hard ceiling in estimated tokens
/// - `thresholds`: ratio boundaries for each [`ContextStatus`]
/// - `compact_keep_recent` / `emergency_keep_recent`: entries kept verbatim
///   at each compaction level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBudget {
    budget_units: usize,
    thresholds: BudgetThresholds,
    compact_keep_recent: usize,
    emergency_keep_recent: usize,
}

impl ContextBudget {
    pub fn new(budget_units: usize) -> Self {
        Self {
            budget_units,
            ..Self::default()
        }
    }

    // ==================== Accessors ====================

    pub fn budget_units(&self) -> usize {
        self.budget_units
    }

    pub fn thresholds(&self) -> &BudgetThresholds {
        &self.thresholds
    }

    pub fn compact_keep_recent(&self) -> usize {
        self.compact_keep_recent
    }

    pub fn emergency_keep_recent(&self) -> usize {
        self.emergency_keep_recent
    }

    // ==================== Builder Methods ====================

    pub fn with_thresholds(mut self, thresholds: BudgetThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_compact_keep_recent(mut self, count: usize) -> Self {
        self.compact_keep_recent = count;
        self
    }

    pub fn with_emergency_keep_recent(mut self, count: usize) -> Self {
        self.emergency_keep_recent = count;
        self
    }

    // ==================== Operations ====================

    /// Measure `used_units` against this budget.
    pub fn check(&self, used_units: usize) -> ContextUsage {
        ContextUsage::measure(used_units, self.budget_units, &self.thresholds)
    }

    /// How many trailing entries a compaction at `status` keeps verbatim.
    pub fn keep_recent_for(&self, status: ContextStatus) -> Option<usize> {
        match status {
            ContextStatus::Compact => Some(self.compact_keep_recent),
            ContextStatus::EmergencyCompact => Some(self.emergency_keep_recent),
            _ => None,
        }
    }

    // ==================== Validation ====================

    /// Validate this budget, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.thresholds.validate();
        if self.emergency_keep_recent > self.compact_keep_recent {
            issues.push(format!(
                "context_budget: emergency_keep_recent ({}) must be <= compact_keep_recent ({})",
                self.emergency_keep_recent, self.compact_keep_recent
            ));
        }
        issues
    }
}

impl Default for ContextBudget {
    /// Default: 24k units, 0.70 / 0.85 / 0.95, keep 6 (compact) or 2 (emergency).
    fn default() -> Self {
        Self {
            budget_units: DEFAULT_BUDGET_UNITS,
            thresholds: BudgetThresholds::default(),
            compact_keep_recent: 6,
            emergency_keep_recent: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(used: usize, budget: usize) -> ContextStatus {
        ContextUsage::measure(used, budget, &BudgetThresholds::default()).status
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(status(699, 1000), ContextStatus::Ok);
        assert_eq!(status(700, 1000), ContextStatus::Warn);
        assert_eq!(status(720, 1000), ContextStatus::Warn);
        assert_eq!(status(849, 1000), ContextStatus::Warn);
        assert_eq!(status(850, 1000), ContextStatus::Compact);
        assert_eq!(status(900, 1000), ContextStatus::Compact);
        assert_eq!(status(950, 1000), ContextStatus::EmergencyCompact);
        assert_eq!(status(960, 1000), ContextStatus::EmergencyCompact);
        assert_eq!(status(5000, 1000), ContextStatus::EmergencyCompact);
    }

    #[test]
    fn test_zero_budget_is_emergency() {
        assert_eq!(status(0, 0), ContextStatus::EmergencyCompact);
        assert_eq!(status(10, 0), ContextStatus::EmergencyCompact);
    }

    #[test]
    fn test_check_is_pure() {
        let budget = ContextBudget::new(1000);
        assert_eq!(budget.check(720), budget.check(720));
        assert_eq!(budget.check(720).percent(), 72);
    }

    #[test]
    fn test_advisory_only_when_not_ok() {
        let budget = ContextBudget::new(1000);
        assert!(budget.check(100).advisory().is_none());
        assert!(budget.check(720).advisory().unwrap().contains("72%"));
    }

    #[test]
    fn test_keep_recent_per_level() {
        let budget = ContextBudget::default();
        assert_eq!(budget.keep_recent_for(ContextStatus::Warn), None);
        assert_eq!(budget.keep_recent_for(ContextStatus::Compact), Some(6));
        assert_eq!(budget.keep_recent_for(ContextStatus::EmergencyCompact), Some(2));
    }

    #[test]
    fn test_validate() {
        assert!(ContextBudget::default().validate().is_empty());

        let bad = ContextBudget::default().with_thresholds(BudgetThresholds {
            warn: 0.9,
            compact: 0.8,
            emergency: 1.2,
        });
        let issues = bad.validate();
        assert_eq!(issues.len(), 2);

        let inverted = ContextBudget::default().with_emergency_keep_recent(10);
        assert_eq!(inverted.validate().len(), 1);
    }
}
