//! State transition engine
//!
//! Applies a batch of invocations strictly in emitted order. Each one is
//! validated against the in-progress session, so clamps and effect toggles
//! earlier in the batch are visible to later entries. The input snapshot is
//! never touched; the caller persists `Transition::session` in one write or
//! discards it.

use super::validator::{validate, StateDelta};
use crate::aggregates::GameSession;
use crate::state_change::{ChangeStatus, StateChange};
use crate::tools::ToolInvocation;

/// The snapshot a batch produced and the per-invocation outcomes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: GameSession,
    pub changes: Vec<StateChange>,
}

impl Transition {
    /// True if any change actually mutated state.
    pub fn mutated(&self) -> bool {
        self.changes.iter().any(StateChange::is_applied)
    }
}

pub fn apply(session: &GameSession, invocations: &[ToolInvocation]) -> Transition {
    let mut next = session.clone();
    let changes = invocations
        .iter()
        .map(|invocation| step(&mut next, invocation))
        .collect();

    Transition {
        session: next,
        changes,
    }
}

/// Apply a single invocation, for human corrections outside a ruling.
pub fn apply_one(session: &GameSession, invocation: &ToolInvocation) -> (GameSession, StateChange) {
    let mut next = session.clone();
    let change = step(&mut next, invocation);
    (next, change)
}

fn step(session: &mut GameSession, invocation: &ToolInvocation) -> StateChange {
    let validation = validate(session, invocation);
    if let Some(delta) = validation.delta {
        write(session, delta);
    }
    if !matches!(validation.change.status, ChangeStatus::Rejected { .. }) {
        session.push_log(validation.change.description.clone());
    }
    validation.change
}

fn write(session: &mut GameSession, delta: StateDelta) {
    match delta {
        StateDelta::SetHp { player, hp } => {
            if let Some(p) = session.player_at_mut(player) {
                p.set_hp(hp);
            }
        }
        StateDelta::SetMp { player, mp } => {
            if let Some(p) = session.player_at_mut(player) {
                p.set_mp(mp);
            }
        }
        StateDelta::AddGlobalEffect { effect } => {
            session.insert_global_effect(effect);
        }
        StateDelta::RemoveGlobalEffect { effect } => {
            session.remove_global_effect(&effect);
        }
        StateDelta::AddEffect { player, effect } => {
            if let Some(p) = session.player_at_mut(player) {
                p.insert_effect(effect);
            }
        }
        StateDelta::RemoveEffect { player, effect } => {
            if let Some(p) = session.player_at_mut(player) {
                p.remove_effect(&effect);
            }
        }
        StateDelta::SetResource {
            player,
            resource,
            quantity,
        } => {
            if let Some(p) = session.player_at_mut(player) {
                p.set_resource(resource, quantity);
            }
        }
        StateDelta::SetTurn {
            current_player,
            round,
        } => session.set_turn(current_player, round),
    }
}
