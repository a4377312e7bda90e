//! Session store and archive ports
//!
//! The store holds live sessions by id for the host process. The archive is
//! the persistence collaborator that receives the final snapshot of a
//! concluded or aborted session. Neither is ever queried mid-deliberation.

use async_trait::async_trait;
use panel_domain::{DecisionClassification, DiscussionSession, SessionFailure, SynthesisReport, TodoItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Explicit get/put/delete interface for sessions, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<DiscussionSession>, StoreError>;

    async fn put(&self, session: &DiscussionSession) -> Result<(), StoreError>;

    /// Returns whether a session was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Read-only hand-off of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: DiscussionSession,
    pub todos: Vec<TodoItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<SynthesisReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<DecisionClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SessionFailure>,
}

#[async_trait]
pub trait SessionArchive: Send + Sync {
    async fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;
}
