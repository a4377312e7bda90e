//! Discussion session entities

use super::phase::Phase;
use crate::core::error::DomainError;
use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Author {
    /// The external caller who opened the discussion
    Requester,
    Participant(ParticipantId),
}

impl Author {
    pub fn participant_id(&self) -> Option<&ParticipantId> {
        match self {
            Author::Participant(id) => Some(id),
            Author::Requester => None,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Requester => f.write_str("requester"),
            Author::Participant(id) => write!(f, "{}", id),
        }
    }
}

/// An immutable entry in the session's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: Author,
    pub phase: Phase,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Strictly increasing within a session, starting at 1
    pub sequence: u64,
}

/// Lifecycle status of a discussion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Converged,
    Aborted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Converged => "converged",
            SessionStatus::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the session is in the phase sequence.
///
/// A single value, so at most one phase can be in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "phase")]
pub enum PhaseState {
    NotStarted,
    InProgress(Phase),
    Concluded,
}

/// A deliberation among the selected participants (Entity).
///
/// Owned by exactly one driver for its lifetime. The message log is
/// append-only; the status only moves from `active` to a terminal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionSession {
    id: String,
    topic: String,
    context: String,
    participants: Vec<ParticipantId>,
    messages: Vec<Message>,
    phase: PhaseState,
    target_rounds: usize,
    rounds_completed: usize,
    status: SessionStatus,
    next_sequence: u64,
    created_at: DateTime<Utc>,
}

impl DiscussionSession {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        context: impl Into<String>,
        participants: Vec<ParticipantId>,
        target_rounds: usize,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            context: context.into(),
            participants,
            messages: Vec::new(),
            phase: PhaseState::NotStarted,
            target_rounds,
            rounds_completed: 0,
            status: SessionStatus::Active,
            next_sequence: 1,
            created_at: Utc::now(),
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    pub fn current_phase(&self) -> Option<Phase> {
        match self.phase {
            PhaseState::InProgress(p) => Some(p),
            _ => None,
        }
    }

    pub fn target_rounds(&self) -> usize {
        self.target_rounds
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_participant(&self, id: &ParticipantId) -> bool {
        self.participants.contains(id)
    }

    pub fn message_by_sequence(&self, sequence: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.sequence == sequence)
    }

    // ==================== Mutations ====================

    /// Append a message, assigning the next sequence number.
    pub fn append_message(
        &mut self,
        author: Author,
        phase: Phase,
        content: impl Into<String>,
    ) -> Result<&Message, DomainError> {
        self.ensure_active()?;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages.push(Message {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            phase,
            content: content.into(),
            timestamp: Utc::now(),
            sequence,
        });

        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Move the session into `phase`.
    pub fn enter_phase(&mut self, phase: Phase) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.phase = PhaseState::InProgress(phase);
        Ok(())
    }

    /// Record one fully completed round.
    pub fn complete_round(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.rounds_completed += 1;
        Ok(())
    }

    /// Terminal transition: the deliberation concluded.
    pub fn converge(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.phase = PhaseState::Concluded;
        self.status = SessionStatus::Converged;
        Ok(())
    }

    /// Terminal transition: the deliberation failed or was cancelled.
    ///
    /// The phase is left as it was so the snapshot shows where it stopped.
    pub fn abort(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = SessionStatus::Aborted;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::SessionNotActive {
                id: self.id.clone(),
                status: self.status.as_str(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DiscussionSession {
        DiscussionSession::new(
            "s-1",
            "Pick a database",
            "We run on AWS",
            vec![ParticipantId::new("architect"), ParticipantId::new("qa_engineer")],
            7,
        )
    }

    #[test]
    fn test_sequences_are_strictly_increasing() {
        let mut s = session();
        let a = s
            .append_message(Author::Requester, Phase::Opening, "hello")
            .unwrap()
            .sequence;
        let b = s
            .append_message(
                Author::Participant("architect".into()),
                Phase::Opening,
                "hi",
            )
            .unwrap()
            .sequence;
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(s.message_by_sequence(2).unwrap().content, "hi");
    }

    #[test]
    fn test_terminal_sessions_reject_mutation() {
        let mut s = session();
        s.converge().unwrap();
        assert_eq!(s.status(), SessionStatus::Converged);
        assert_eq!(s.phase(), PhaseState::Concluded);

        let err = s
            .append_message(Author::Requester, Phase::Opening, "late")
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionNotActive { .. }));
        assert!(s.abort().is_err());
    }

    #[test]
    fn test_abort_keeps_phase() {
        let mut s = session();
        s.enter_phase(Phase::Debate).unwrap();
        s.abort().unwrap();
        assert_eq!(s.status(), SessionStatus::Aborted);
        assert_eq!(s.current_phase(), Some(Phase::Debate));
    }

    #[test]
    fn test_session_serializes() {
        let mut s = session();
        s.enter_phase(Phase::Opening).unwrap();
        s.append_message(Author::Participant("architect".into()), Phase::Opening, "x")
            .unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["phase"]["state"], "in_progress");
        assert_eq!(json["messages"][0]["author"]["id"], "architect");
    }
}
