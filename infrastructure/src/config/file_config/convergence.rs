//! Convergence configuration from TOML (`[convergence]` section)

use panel_domain::{ConfigIssue, ConfigIssueCode, ConvergenceWeights};
use serde::{Deserialize, Serialize};

/// Weights of the default novelty-based convergence check.
///
/// ```toml
/// [convergence]
/// novelty_weight = 1.0
/// progress_weight = 0.5
/// threshold = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConvergenceConfig {
    pub novelty_weight: f64,
    pub progress_weight: f64,
    pub threshold: f64,
}

impl Default for FileConvergenceConfig {
    fn default() -> Self {
        let weights = ConvergenceWeights::default();
        Self {
            novelty_weight: weights.novelty_weight,
            progress_weight: weights.progress_weight,
            threshold: weights.threshold,
        }
    }
}

impl FileConvergenceConfig {
    pub fn to_weights(&self) -> (ConvergenceWeights, Vec<ConfigIssue>) {
        let values = [
            ("novelty_weight", self.novelty_weight),
            ("progress_weight", self.progress_weight),
        ];
        let issues: Vec<ConfigIssue> = values
            .iter()
            .filter(|(_, v)| !v.is_finite() || *v < 0.0)
            .map(|(name, v)| {
                ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: format!("convergence.{}", name),
                    },
                    format!("convergence.{} ({}) must be a non-negative number", name, v),
                )
            })
            .chain((!self.threshold.is_finite()).then(|| {
                ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: "convergence.threshold".to_string(),
                    },
                    "convergence.threshold must be a finite number",
                )
            }))
            .collect();

        if !issues.is_empty() {
            return (ConvergenceWeights::default(), issues);
        }
        (
            ConvergenceWeights {
                novelty_weight: self.novelty_weight,
                progress_weight: self.progress_weight,
                threshold: self.threshold,
            },
            issues,
        )
    }
}
