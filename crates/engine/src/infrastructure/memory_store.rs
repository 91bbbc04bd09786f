//! In-process session store.
//!
//! Holds each session as one record in a `DashMap`, so a `put` replaces the
//! whole snapshot atomically with respect to concurrent readers. Suitable for
//! a single engine process and as the test double for the store port.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rulewarden_domain::{GameSession, SessionId};

use crate::infrastructure::ports::{SessionStore, StoreError};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, GameSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: SessionId) -> Result<Option<GameSession>, StoreError> {
        Ok(self.sessions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, session: &GameSession) -> Result<(), StoreError> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(session.id().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn put(&self, session: &GameSession, expected_version: u64) -> Result<(), StoreError> {
        // The entry guard holds the shard lock, so compare and swap happen together.
        match self.sessions.entry(session.id()) {
            Entry::Vacant(_) => Err(StoreError::not_found(session.id())),
            Entry::Occupied(mut slot) => {
                let actual = slot.get().version();
                if actual != expected_version {
                    return Err(StoreError::Conflict {
                        id: session.id().to_string(),
                        expected: expected_version,
                        actual,
                    });
                }
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn delete(&self, id: SessionId) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<GameSession>, StoreError> {
        let mut sessions: Vec<GameSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|s| s.created_at());
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rulewarden_domain::{GameId, PlayerSpec, SessionLimits};

    fn session() -> GameSession {
        GameSession::new(
            GameId::new("Catan").unwrap(),
            vec![PlayerSpec::new("Alice", 10)],
            SessionLimits::default(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        let s = session();
        store.insert(&s).await.unwrap();

        assert_eq!(store.get(s.id()).await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let store = InMemorySessionStore::new();
        let s = session();
        store.insert(&s).await.unwrap();

        let err = store.insert(&s).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn put_with_stale_version_conflicts() {
        let store = InMemorySessionStore::new();
        let mut s = session();
        store.insert(&s).await.unwrap();

        s.bump_version(s.updated_at());
        store.put(&s, 0).await.unwrap();

        // Second writer still believes version 0 is current
        let mut stale = session().with_id(s.id());
        stale.bump_version(stale.updated_at());
        let err = store.put(&stale, 0).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get(s.id()).await.unwrap().unwrap().version(), 1);
    }

    #[tokio::test]
    async fn put_on_missing_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.put(&session(), 0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemorySessionStore::new();
        let s = session();
        store.insert(&s).await.unwrap();

        assert!(store.delete(s.id()).await.unwrap());
        assert!(!store.delete(s.id()).await.unwrap());
        assert!(store.is_empty());
    }
}
