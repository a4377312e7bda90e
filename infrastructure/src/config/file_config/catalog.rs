//! Participant catalog from TOML (`[catalog]` section)
//!
//! Any table left empty is taken from the built-in catalog.
//!
//! ```toml
//! [[catalog.participants]]
//! id = "data_scientist"
//! display_role = "Data Scientist"
//! focus = ["ml", "data"]
//! style = ["empirical"]
//!
//! [catalog.phases]
//! discovery = ["product_manager", "data_scientist"]
//!
//! [[catalog.topics]]
//! keywords = ["model", "training"]
//! tags = ["ml"]
//! ```

use panel_domain::{
    ConfigIssue, ConfigIssueCode, Participant, ParticipantCatalog, ParticipantId, PhaseRoster,
    TopicRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    pub participants: Vec<Participant>,
    /// Project phase → core participant ids
    pub phases: BTreeMap<String, Vec<String>>,
    pub topics: Vec<TopicRule>,
}

impl FileCatalogConfig {
    /// Build the catalog, falling back to [`ParticipantCatalog::builtin`]
    /// when the configured tables do not form a valid catalog.
    pub fn to_catalog(&self) -> (ParticipantCatalog, Vec<ConfigIssue>) {
        let builtin = ParticipantCatalog::builtin();
        if self == &Self::default() {
            return (builtin, vec![]);
        }

        let participants = if self.participants.is_empty() {
            builtin.participants().to_vec()
        } else {
            self.participants.clone()
        };
        let rosters = if self.phases.is_empty() {
            builtin.phase_rosters().to_vec()
        } else {
            self.phases
                .iter()
                .map(|(phase, ids)| PhaseRoster {
                    phase: phase.clone(),
                    core: ids.iter().map(|id| ParticipantId::new(id.as_str())).collect(),
                })
                .collect()
        };
        let topics = if self.topics.is_empty() {
            builtin.topic_rules().to_vec()
        } else {
            self.topics.clone()
        };

        let mut issues = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for p in &participants {
            if !seen.insert(p.id.as_str()) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: "catalog.participants".to_string(),
                    },
                    format!("catalog.participants: duplicate id '{}'", p.id),
                ));
            }
        }
        for roster in &rosters {
            for id in roster.core.iter().filter(|id| !participants.iter().any(|p| &p.id == *id)) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownReference {
                        field: format!("catalog.phases.{}", roster.phase),
                        value: id.to_string(),
                    },
                    format!(
                        "catalog.phases.{}: unknown participant '{}'",
                        roster.phase, id
                    ),
                ));
            }
        }
        if !issues.is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidConstraint {
                    field: "catalog".to_string(),
                },
                "catalog: using the built-in catalog",
            ));
            return (builtin, issues);
        }

        match ParticipantCatalog::new(participants, rosters, topics) {
            Ok(catalog) => (catalog, issues),
            Err(e) => (
                builtin,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: "catalog".to_string(),
                    },
                    format!("catalog: {}; using the built-in catalog", e),
                )],
            ),
        }
    }
}
