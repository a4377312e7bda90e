//! Context budget configuration from TOML (`[context_budget]` section)

use panel_domain::{BudgetThresholds, ConfigIssue, ConfigIssueCode, ContextBudget};
use serde::{Deserialize, Serialize};

/// Context budget configuration from TOML.
///
/// Controls how much of the working window may be sent per generation call
/// and when it is compacted.
///
/// # Example
///
/// ```toml
/// [context_budget]
/// budget_units = 32000
/// warn_ratio = 0.7
/// compact_ratio = 0.85
/// emergency_ratio = 0.95
/// compact_keep_recent = 6
/// emergency_keep_recent = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContextBudgetConfig {
    /// Hard ceiling in estimated tokens
    pub budget_units: usize,
    pub warn_ratio: f64,
    pub compact_ratio: f64,
    pub emergency_ratio: f64,
    /// Entries kept verbatim by a standard compaction
    pub compact_keep_recent: usize,
    /// Entries kept verbatim by an emergency compaction
    pub emergency_keep_recent: usize,
}

impl Default for FileContextBudgetConfig {
    fn default() -> Self {
        let budget = ContextBudget::default();
        let thresholds = budget.thresholds();
        Self {
            budget_units: budget.budget_units(),
            warn_ratio: thresholds.warn,
            compact_ratio: thresholds.compact,
            emergency_ratio: thresholds.emergency,
            compact_keep_recent: budget.compact_keep_recent(),
            emergency_keep_recent: budget.emergency_keep_recent(),
        }
    }
}

impl FileContextBudgetConfig {
    /// Convert to domain `ContextBudget`, returning validation issues.
    ///
    /// If the values violate constraints, falls back to `ContextBudget::default()`
    /// and returns warnings describing the issues.
    pub fn to_context_budget(&self) -> (ContextBudget, Vec<ConfigIssue>) {
        let budget = ContextBudget::new(self.budget_units)
            .with_thresholds(BudgetThresholds {
                warn: self.warn_ratio,
                compact: self.compact_ratio,
                emergency: self.emergency_ratio,
            })
            .with_compact_keep_recent(self.compact_keep_recent)
            .with_emergency_keep_recent(self.emergency_keep_recent);

        let errors = budget.validate();
        if errors.is_empty() {
            return (budget, vec![]);
        }

        let issues = errors
            .into_iter()
            .map(|msg| {
                ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: "context_budget".to_string(),
                    },
                    msg,
                )
            })
            .collect();
        (ContextBudget::default(), issues)
    }
}
