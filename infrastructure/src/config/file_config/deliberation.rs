//! Deliberation configuration from TOML (`[deliberation]` section)

use panel_application::DeliberationParams;
use panel_domain::{ConfigIssue, ConfigIssueCode, Phase};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round loop configuration from TOML.
///
/// # Example
///
/// ```toml
/// [deliberation]
/// phases = ["opening", "debate", "synthesis"]
/// max_total_rounds = 8
/// max_extra_rounds = 1
/// max_participants = 4
/// max_tokens = 1024
/// call_timeout_secs = 90
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    /// Phase names in deliberation order
    pub phases: Vec<String>,
    pub max_total_rounds: usize,
    pub max_extra_rounds: usize,
    pub max_participants: usize,
    pub max_tokens: u32,
    /// Per-call timeout; 0 disables it
    pub call_timeout_secs: u64,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        let params = DeliberationParams::default();
        Self {
            phases: params.phases.iter().map(|p| p.as_str().to_string()).collect(),
            max_total_rounds: params.max_total_rounds,
            max_extra_rounds: params.max_extra_rounds,
            max_participants: params.max_participants,
            max_tokens: params.max_tokens,
            call_timeout_secs: params.call_timeout.map(|d| d.as_secs()).unwrap_or(0),
        }
    }
}

impl FileDeliberationConfig {
    /// Convert to [`DeliberationParams`], returning validation issues.
    ///
    /// Unknown phase names or an invalid phase plan fall back to the
    /// default phase sequence and round limits.
    pub fn to_params(&self) -> (DeliberationParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let defaults = DeliberationParams::default();

        let mut phases = Vec::new();
        for name in &self.phases {
            match name.parse::<Phase>() {
                Ok(phase) => phases.push(phase),
                Err(_) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "deliberation.phases".to_string(),
                        value: name.clone(),
                        valid_values: Phase::ALL.iter().map(|p| p.as_str().to_string()).collect(),
                    },
                    format!(
                        "deliberation.phases: unknown phase '{}', using the default sequence",
                        name
                    ),
                )),
            }
        }
        if !issues.is_empty() {
            phases = defaults.phases.clone();
        }

        let mut params = DeliberationParams::default()
            .with_phases(phases)
            .with_max_total_rounds(self.max_total_rounds)
            .with_max_extra_rounds(self.max_extra_rounds)
            .with_max_participants(self.max_participants.max(1))
            .with_max_tokens(self.max_tokens)
            .with_call_timeout(match self.call_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            });

        if let Err(e) = params.phase_plan() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidConstraint {
                    field: "deliberation".to_string(),
                },
                format!("deliberation: {}; using the default phase plan", e),
            ));
            params = params
                .with_phases(defaults.phases)
                .with_max_total_rounds(defaults.max_total_rounds)
                .with_max_extra_rounds(defaults.max_extra_rounds);
        }

        (params, issues)
    }
}
