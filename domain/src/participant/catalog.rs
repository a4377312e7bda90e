//! Read-only participant catalog and lookup tables.
//!
//! The catalog bundles three static tables:
//!
//! - the participant entries themselves (catalog order matters for selection)
//! - project phase → core participant ids
//! - topic keyword rules → participant focus tags
//!
//! It is built once by the host (from configuration or [`ParticipantCatalog::builtin`])
//! and shared read-only between sessions, typically as `Arc<ParticipantCatalog>`.

use super::entities::{Participant, ParticipantId};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Maps topic keywords to participant focus tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    /// Keywords searched for (case-insensitive) in the discussion topic
    pub keywords: Vec<String>,
    /// Focus tags of the participants pulled in when a keyword matches
    pub tags: Vec<String>,
}

impl TopicRule {
    pub fn new(keywords: &[&str], tags: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Whether any keyword starts a word of the topic (case-insensitive).
    ///
    /// Prefix matching lets `auth` match "authentication" without letting
    /// `ui` match "build".
    pub fn matches(&self, topic: &str) -> bool {
        let words: Vec<String> = topic
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();
        self.keywords.iter().any(|k| {
            let k = k.trim().to_lowercase();
            !k.is_empty() && words.iter().any(|w| w.starts_with(&k))
        })
    }
}

/// Core participants for one project phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRoster {
    pub phase: String,
    pub core: Vec<ParticipantId>,
}

/// Immutable participant catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCatalog {
    participants: Vec<Participant>,
    phase_rosters: Vec<PhaseRoster>,
    topic_rules: Vec<TopicRule>,
}

impl ParticipantCatalog {
    /// Build a catalog, validating that every roster references known ids.
    pub fn new(
        participants: Vec<Participant>,
        phase_rosters: Vec<PhaseRoster>,
        topic_rules: Vec<TopicRule>,
    ) -> Result<Self, DomainError> {
        if participants.is_empty() {
            return Err(DomainError::EmptyCatalog);
        }

        let catalog = Self {
            participants,
            phase_rosters,
            topic_rules,
        };

        for roster in &catalog.phase_rosters {
            if let Some(unknown) = roster.core.iter().find(|id| !catalog.contains(id)) {
                return Err(DomainError::InvalidConfig(format!(
                    "phase '{}' references unknown participant '{}'",
                    roster.phase, unknown
                )));
            }
        }

        Ok(catalog)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn topic_rules(&self) -> &[TopicRule] {
        &self.topic_rules
    }

    pub fn phase_rosters(&self) -> &[PhaseRoster] {
        &self.phase_rosters
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Core participant ids for a project phase (case-insensitive lookup).
    pub fn core_for_phase(&self, phase: &str) -> &[ParticipantId] {
        self.phase_rosters
            .iter()
            .find(|r| r.phase.eq_ignore_ascii_case(phase.trim()))
            .map(|r| r.core.as_slice())
            .unwrap_or(&[])
    }

    /// Known project phase names, in table order.
    pub fn project_phases(&self) -> Vec<&str> {
        self.phase_rosters.iter().map(|r| r.phase.as_str()).collect()
    }

    /// The built-in product-team catalog.
    pub fn builtin() -> Self {
        let participants = vec![
            Participant::new("product_manager", "Product Manager")
                .with_focus(&["product", "requirements", "users", "business", "roadmap"])
                .with_style(&["outcome-driven", "prioritizing"]),
            Participant::new("architect", "Software Architect")
                .with_focus(&["architecture", "api", "scalability", "integration", "database"])
                .with_style(&["systematic", "long-term"]),
            Participant::new("backend_engineer", "Backend Engineer")
                .with_focus(&["backend", "database", "api", "performance"])
                .with_style(&["pragmatic", "detail-oriented"]),
            Participant::new("frontend_engineer", "Frontend Engineer")
                .with_focus(&["frontend", "ui", "accessibility", "performance"])
                .with_style(&["user-facing", "iterative"]),
            Participant::new("designer", "UX Designer")
                .with_focus(&["ux", "ui", "users", "accessibility"])
                .with_style(&["empathetic", "visual"]),
            Participant::new("qa_engineer", "QA Engineer")
                .with_focus(&["testing", "quality", "regression"])
                .with_style(&["skeptical", "thorough"]),
            Participant::new("security_engineer", "Security Engineer")
                .with_focus(&["security", "privacy", "compliance", "auth"])
                .with_style(&["risk-averse", "adversarial"]),
            Participant::new("devops_engineer", "DevOps Engineer")
                .with_focus(&["infrastructure", "deployment", "monitoring", "reliability"])
                .with_style(&["operational", "automation-first"]),
        ];

        let roster = |phase: &str, ids: &[&str]| PhaseRoster {
            phase: phase.to_string(),
            core: ids.iter().map(|id| ParticipantId::new(*id)).collect(),
        };

        let phase_rosters = vec![
            roster("discovery", &["product_manager", "designer", "architect"]),
            roster("design", &["architect", "designer", "backend_engineer"]),
            roster(
                "implementation",
                &["backend_engineer", "frontend_engineer", "architect"],
            ),
            roster("testing", &["qa_engineer", "backend_engineer"]),
            roster("launch", &["devops_engineer", "product_manager", "qa_engineer"]),
        ];

        let topic_rules = vec![
            TopicRule::new(
                &["security", "auth", "login", "password", "encrypt", "gdpr", "privacy"],
                &["security"],
            ),
            TopicRule::new(&["database", "schema", "sql", "migration"], &["database"]),
            TopicRule::new(&["api", "endpoint", "integration"], &["api"]),
            TopicRule::new(&["ui", "screen", "layout", "onboarding", "ux"], &["ui", "ux"]),
            TopicRule::new(&["test", "bug", "regression", "quality"], &["testing"]),
            TopicRule::new(
                &["deploy", "infrastructure", "kubernetes", "monitoring", "outage"],
                &["infrastructure", "deployment"],
            ),
            TopicRule::new(&["performance", "latency", "scale"], &["performance", "scalability"]),
            TopicRule::new(&["pricing", "roadmap", "market", "feature"], &["product"]),
        ];

        Self {
            participants,
            phase_rosters,
            topic_rules,
        }
    }
}
