//! Read, list, reset, and delete sessions.

use std::sync::Arc;

use rulewarden_domain::{GameSession, SessionId, SessionSummary};

use crate::infrastructure::ports::{ClockPort, SessionStore};
use crate::use_cases::commit::commit;
use crate::use_cases::error::EngineError;
use crate::use_cases::gate::SessionGate;

pub struct GetSession {
    store: Arc<dyn SessionStore>,
}

impl GetSession {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, id: SessionId) -> Result<GameSession, EngineError> {
        self.store
            .get(id)
            .await
            .map_err(|e| EngineError::store(id, e))?
            .ok_or(EngineError::SessionNotFound(id))
    }
}

pub struct ListSessions {
    store: Arc<dyn SessionStore>,
}

impl ListSessions {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<Vec<SessionSummary>, EngineError> {
        let sessions = self.store.list().await.map_err(EngineError::Storage)?;
        Ok(sessions.iter().map(GameSession::summary).collect())
    }
}

pub struct ResetSession {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn ClockPort>,
    gate: SessionGate,
}

impl ResetSession {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn ClockPort>, gate: SessionGate) -> Self {
        Self { store, clock, gate }
    }

    /// Back to creation-time values; identity and players survive.
    pub async fn execute(&self, id: SessionId) -> Result<(), EngineError> {
        let (_guard, snapshot) = self.gate.open(self.store.as_ref(), id).await?;

        commit(self.store.as_ref(), self.clock.as_ref(), snapshot, |base, now| {
            let mut next = base.clone();
            next.reset(now);
            (next, ())
        })
        .await?;

        tracing::info!(session_id = %id, "Session reset");
        Ok(())
    }
}

pub struct DeleteSession {
    store: Arc<dyn SessionStore>,
    gate: SessionGate,
}

impl DeleteSession {
    pub fn new(store: Arc<dyn SessionStore>, gate: SessionGate) -> Self {
        Self { store, gate }
    }

    pub async fn execute(&self, id: SessionId) -> Result<(), EngineError> {
        let guard = self.gate.enter(id).await?;
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|e| EngineError::store(id, e))?;
        drop(guard);
        self.gate.forget(id);

        if !removed {
            return Err(EngineError::SessionNotFound(id));
        }
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }
}
