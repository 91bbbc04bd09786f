//! Human-driven corrections: single invocations routed through the same
//! validator, transition engine, and session lock as model rulings.

use std::sync::Arc;

use rulewarden_domain::{apply_one, ManualAdjustment, SessionId, StateChange, ToolInvocation};

use crate::infrastructure::ports::{ClockPort, SessionStore};
use crate::use_cases::commit::commit;
use crate::use_cases::error::EngineError;
use crate::use_cases::gate::SessionGate;

pub struct AdjustSession {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn ClockPort>,
    gate: SessionGate,
}

impl AdjustSession {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn ClockPort>, gate: SessionGate) -> Self {
        Self { store, clock, gate }
    }

    pub async fn manual_adjust(
        &self,
        id: SessionId,
        player: &str,
        adjustment: ManualAdjustment,
    ) -> Result<StateChange, EngineError> {
        self.execute(id, adjustment.into_invocation(player)).await
    }

    /// Pass the turn to the next player in seat order.
    pub async fn advance_round(&self, id: SessionId) -> Result<StateChange, EngineError> {
        self.execute(id, ToolInvocation::next_round()).await
    }

    /// Start (`active`) or end an effect that applies to the whole table.
    pub async fn set_global_effect(
        &self,
        id: SessionId,
        effect: &str,
        active: bool,
    ) -> Result<StateChange, EngineError> {
        let invocation = if active {
            ToolInvocation::apply_global_effect(effect)
        } else {
            ToolInvocation::remove_global_effect(effect)
        };
        self.execute(id, invocation).await
    }

    /// Validate and apply one invocation. Rejections come back as a rejected
    /// `StateChange`, not an error.
    pub async fn execute(
        &self,
        id: SessionId,
        invocation: ToolInvocation,
    ) -> Result<StateChange, EngineError> {
        let (_guard, snapshot) = self.gate.open(self.store.as_ref(), id).await?;

        let change = commit(self.store.as_ref(), self.clock.as_ref(), snapshot, |base, _| {
            apply_one(base, &invocation)
        })
        .await?;

        if let Some(reason) = change.status.rejection_reason() {
            tracing::warn!(session_id = %id, action = %change.action, reason, "Adjustment rejected");
        } else {
            tracing::debug!(session_id = %id, change = %change.description, "Adjustment applied");
        }
        Ok(change)
    }
}
