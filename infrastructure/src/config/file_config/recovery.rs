//! Recovery configuration from TOML (`[recovery]` section)

use panel_domain::{ConfigIssue, ConfigIssueCode, RecoveryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration from TOML.
///
/// ```toml
/// [recovery]
/// backoff_secs = [1, 2, 5]
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecoveryConfig {
    /// Delay before each retry; the last value repeats
    pub backoff_secs: Vec<u64>,
    /// Retries for transient errors
    pub max_attempts: usize,
}

impl Default for FileRecoveryConfig {
    fn default() -> Self {
        let policy = RecoveryPolicy::default();
        Self {
            backoff_secs: policy.backoff().iter().map(|d| d.as_secs()).collect(),
            max_attempts: policy.max_attempts(),
        }
    }
}

impl FileRecoveryConfig {
    pub fn to_policy(&self) -> (RecoveryPolicy, Vec<ConfigIssue>) {
        let policy = RecoveryPolicy::new(
            self.backoff_secs.iter().map(|s| Duration::from_secs(*s)).collect(),
            self.max_attempts,
        );
        let errors = policy.validate();
        if errors.is_empty() {
            return (policy, vec![]);
        }

        let issues = errors
            .into_iter()
            .map(|msg| {
                ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: "recovery".to_string(),
                    },
                    msg,
                )
            })
            .collect();
        (RecoveryPolicy::default(), issues)
    }
}
