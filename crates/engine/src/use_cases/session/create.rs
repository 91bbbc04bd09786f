//! Create a session from a game id and player specs.

use std::sync::Arc;

use rulewarden_domain::{GameId, GameSession, PlayerSpec, SessionId, SessionLimits};

use crate::infrastructure::ports::{ClockPort, SessionStore};
use crate::use_cases::error::EngineError;

pub struct CreateSession {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn ClockPort>,
    limits: SessionLimits,
}

impl CreateSession {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn ClockPort>, limits: SessionLimits) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    /// Round 1, first listed player to act, everyone at starting health.
    pub async fn execute(
        &self,
        game_id: &str,
        players: Vec<PlayerSpec>,
    ) -> Result<SessionId, EngineError> {
        let game_id = GameId::new(game_id)?;
        let session = GameSession::new(game_id, players, self.limits, self.clock.now())?;
        let id = session.id();

        self.store
            .insert(&session)
            .await
            .map_err(|e| EngineError::store(id, e))?;

        tracing::info!(
            session_id = %id,
            game_id = %session.game_id(),
            players = session.players().len(),
            "Session created"
        );
        Ok(id)
    }
}
