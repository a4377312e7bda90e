//! In-memory session store

use async_trait::async_trait;
use panel_application::{SessionStore, StoreError};
use panel_domain::DiscussionSession;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local [`SessionStore`] keyed by session id.
///
/// `put` stores a copy; the driving loop keeps ownership of the live session.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, DiscussionSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Ids of all stored sessions, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<DiscussionSession>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn put(&self, session: &DiscussionSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_domain::{Author, ParticipantId, Phase};

    fn session(id: &str) -> DiscussionSession {
        DiscussionSession::new(
            id,
            "Adopt event sourcing?",
            "",
            vec![ParticipantId::new("architect")],
            5,
        )
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemorySessionStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        store.put(&session("a")).await.unwrap();
        store.put(&session("b")).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert_eq!(store.ids().await, vec!["a", "b"]);

        let loaded = store.get("a").await.unwrap().unwrap();
        assert_eq!(loaded.topic(), "Adopt event sourcing?");

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.ids().await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_put_replaces_snapshot() {
        let store = InMemorySessionStore::new();
        let mut live = session("a");
        store.put(&live).await.unwrap();

        live.enter_phase(Phase::Opening).unwrap();
        live.append_message(Author::Requester, Phase::Opening, "kickoff")
            .unwrap();

        assert!(store.get("a").await.unwrap().unwrap().messages().is_empty());
        store.put(&live).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap().messages().len(), 1);
    }
}
