//! Participant selection for a discussion.
//!
//! Selection is deterministic: identical inputs always produce the same
//! ordered id list.
//!
//! 1. Explicit list given → keep the known ids (in the given order), drop the rest.
//! 2. Otherwise → core participants of the project phase, then participants
//!    pulled in by topic keyword rules, de-duplicated, truncated to the cap.

use super::catalog::ParticipantCatalog;
use super::entities::ParticipantId;
use crate::core::error::DomainError;

/// Default maximum number of participants in one discussion.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 5;

/// Input for [`ParticipantSelector::select`].
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub topic: String,
    pub project_phase: String,
    pub explicit: Option<Vec<String>>,
    pub max_participants: usize,
}

impl SelectionRequest {
    pub fn new(topic: impl Into<String>, project_phase: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            project_phase: project_phase.into(),
            explicit: None,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }

    pub fn with_explicit(mut self, ids: Vec<String>) -> Self {
        self.explicit = Some(ids);
        self
    }

    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected participant ids, in speaking order
    pub participants: Vec<ParticipantId>,
    /// Explicitly requested ids that are not in the catalog
    pub ignored: Vec<String>,
}

/// Picks the participants of a discussion from a read-only catalog.
pub struct ParticipantSelector<'a> {
    catalog: &'a ParticipantCatalog,
}

impl<'a> ParticipantSelector<'a> {
    pub fn new(catalog: &'a ParticipantCatalog) -> Self {
        Self { catalog }
    }

    pub fn select(&self, request: &SelectionRequest) -> Result<Selection, DomainError> {
        if self.catalog.participants().is_empty() {
            return Err(DomainError::EmptyCatalog);
        }

        if let Some(explicit) = &request.explicit
            && !explicit.is_empty()
        {
            return self.select_explicit(explicit);
        }

        let cap = request.max_participants.max(1);
        let mut selected: Vec<ParticipantId> = Vec::new();

        for id in self.catalog.core_for_phase(&request.project_phase) {
            push_unique(&mut selected, id);
        }

        for rule in self.catalog.topic_rules() {
            if !rule.matches(&request.topic) {
                continue;
            }
            for participant in self.catalog.participants() {
                if participant.has_any_focus(&rule.tags) {
                    push_unique(&mut selected, &participant.id);
                }
            }
        }

        selected.truncate(cap);

        if selected.is_empty() {
            return Err(DomainError::NoParticipants {
                phase: request.project_phase.clone(),
            });
        }

        Ok(Selection {
            participants: selected,
            ignored: Vec::new(),
        })
    }

    fn select_explicit(&self, explicit: &[String]) -> Result<Selection, DomainError> {
        let mut participants = Vec::new();
        let mut ignored = Vec::new();

        for raw in explicit {
            let id = ParticipantId::new(raw.trim());
            if self.catalog.contains(&id) {
                push_unique(&mut participants, &id);
            } else {
                ignored.push(raw.clone());
            }
        }

        if participants.is_empty() {
            return Err(DomainError::UnknownParticipants(ignored));
        }

        Ok(Selection {
            participants,
            ignored,
        })
    }
}

fn push_unique(list: &mut Vec<ParticipantId>, id: &ParticipantId) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}
