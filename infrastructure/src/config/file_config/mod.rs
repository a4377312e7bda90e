//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain types with
//! lenient validation.

mod catalog;
mod context_budget;
mod convergence;
mod deliberation;
mod generation;
mod output;
mod recovery;

pub use catalog::FileCatalogConfig;
pub use context_budget::FileContextBudgetConfig;
pub use convergence::FileConvergenceConfig;
pub use deliberation::FileDeliberationConfig;
pub use generation::FileGenerationConfig;
pub use output::{FileOutputConfig, ReportFormat};
pub use recovery::FileRecoveryConfig;

use panel_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Round loop settings
    pub deliberation: FileDeliberationConfig,
    /// Context budget settings
    pub context_budget: FileContextBudgetConfig,
    /// Retry and backoff
    pub recovery: FileRecoveryConfig,
    /// Convergence heuristic weights
    pub convergence: FileConvergenceConfig,
    /// Generation endpoint
    pub generation: FileGenerationConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Participant catalog overrides
    pub catalog: FileCatalogConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. Every section
    /// with a fallback reports the issues that triggered it.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.deliberation.to_params().1);
        issues.extend(self.context_budget.to_context_budget().1);
        issues.extend(self.recovery.to_policy().1);
        issues.extend(self.convergence.to_weights().1);
        issues.extend(self.generation.validate());
        issues.extend(self.output.parse_format().1);
        issues.extend(self.catalog.to_catalog().1);

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_domain::{ConfigIssueCode, Phase, Severity};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[deliberation]
phases = ["opening", "synthesis"]
max_total_rounds = 4

[context_budget]
budget_units = 8000

[recovery]
backoff_secs = [0, 1]
max_attempts = 2

[convergence]
threshold = 0.3

[generation]
base_url = "http://localhost:11434/v1"
model = "llama3"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(
            config.deliberation.to_params().0.phases,
            vec![Phase::Opening, Phase::Synthesis]
        );
        assert_eq!(config.context_budget.budget_units, 8000);
        assert_eq!(config.recovery.max_attempts, 2);
        assert_eq!(config.generation.model, "llama3");
        assert!(!config.output.color);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FileConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_collects_issues_from_every_section() {
        let toml_str = r#"
[deliberation]
phases = ["brainstorm"]

[context_budget]
warn_ratio = 1.5

[output]
format = "xml"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(
            issues
                .iter()
                .filter(|i| matches!(i.code, ConfigIssueCode::InvalidEnumValue { .. }))
                .count(),
            2
        );
        assert!(
            issues
                .iter()
                .any(|i| matches!(&i.code, ConfigIssueCode::InvalidConstraint { field } if field == "context_budget"))
        );
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: FileConfig = toml::from_str("[legacy]\nenabled = true\n").unwrap();
        assert_eq!(config, FileConfig::default());
    }
}
