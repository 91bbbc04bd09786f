//! Entry point to a session's critical section.

use std::sync::Arc;

use rulewarden_domain::{GameSession, SessionId};

use super::error::EngineError;
use crate::infrastructure::ports::SessionStore;
use crate::stores::{BusyPolicy, SessionGuard, SessionLocks};

/// Pairs the shared lock arena with the configured busy policy.
#[derive(Clone)]
pub struct SessionGate {
    locks: Arc<SessionLocks>,
    policy: BusyPolicy,
}

impl SessionGate {
    pub fn new(locks: Arc<SessionLocks>, policy: BusyPolicy) -> Self {
        Self { locks, policy }
    }

    pub async fn enter(&self, id: SessionId) -> Result<SessionGuard, EngineError> {
        self.locks.acquire(id, self.policy).await.ok_or_else(|| {
            tracing::debug!(session_id = %id, "Session busy, rejecting call");
            EngineError::SessionBusy(id)
        })
    }

    /// Enter the critical section and load the session under it. When the
    /// session does not exist the guard is released and its lock entry
    /// evicted again.
    pub async fn open(
        &self,
        store: &dyn SessionStore,
        id: SessionId,
    ) -> Result<(SessionGuard, GameSession), EngineError> {
        let guard = self.enter(id).await?;
        let loaded = store.get(id).await.map_err(|e| EngineError::store(id, e));
        match loaded {
            Ok(Some(session)) => Ok((guard, session)),
            Ok(None) => {
                drop(guard);
                self.locks.remove_if_idle(id);
                Err(EngineError::SessionNotFound(id))
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the lock entry of a deleted session.
    pub fn forget(&self, id: SessionId) {
        self.locks.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::InMemorySessionStore;
    use chrono::{TimeZone, Utc};
    use rulewarden_domain::{GameId, PlayerSpec, SessionLimits};

    #[tokio::test]
    async fn unknown_ids_leave_no_lock_behind() {
        let locks = Arc::new(SessionLocks::new());
        let gate = SessionGate::new(Arc::clone(&locks), BusyPolicy::Queue);
        let store = InMemorySessionStore::new();

        for _ in 0..50 {
            let opened = gate.open(&store, SessionId::new()).await;
            assert!(matches!(opened, Err(EngineError::SessionNotFound(_))));
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn open_returns_the_stored_session_under_its_lock() {
        let locks = Arc::new(SessionLocks::new());
        let gate = SessionGate::new(Arc::clone(&locks), BusyPolicy::Reject);
        let store = InMemorySessionStore::new();
        let session = GameSession::new(
            GameId::new("Gloomhaven").unwrap(),
            vec![PlayerSpec::new("Alice", 10)],
            SessionLimits::default(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
        .unwrap();
        store.insert(&session).await.unwrap();

        let (guard, loaded) = gate.open(&store, session.id()).await.unwrap();
        assert_eq!(loaded, session);
        assert!(matches!(
            gate.enter(session.id()).await,
            Err(EngineError::SessionBusy(_))
        ));

        drop(guard);
        assert_eq!(locks.len(), 1);
    }
}
