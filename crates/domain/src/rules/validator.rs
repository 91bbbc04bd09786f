//! Tool invocation validator
//!
//! Pure function of `(session, invocation)`. It never mutates; the transition
//! engine applies the returned `StateDelta` when the change is not rejected.

use crate::aggregates::GameSession;
use crate::state_change::{ChangeKind, StateChange};
use crate::tools::ToolInvocation;

/// Reason attached to tool calls the engine does not implement.
pub const UNRECOGNIZED_ACTION: &str = "unrecognized action";

/// A concrete write the transition engine performs for an accepted change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDelta {
    SetHp {
        player: usize,
        hp: i32,
    },
    SetMp {
        player: usize,
        mp: i32,
    },
    AddGlobalEffect {
        effect: String,
    },
    RemoveGlobalEffect {
        effect: String,
    },
    AddEffect {
        player: usize,
        effect: String,
    },
    RemoveEffect {
        player: usize,
        effect: String,
    },
    SetResource {
        player: usize,
        resource: String,
        quantity: i64,
    },
    SetTurn {
        current_player: usize,
        round: u32,
    },
}

/// Validator output: the change to report and, unless it was rejected or is
/// a no-op, the delta to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub change: StateChange,
    pub delta: Option<StateDelta>,
}

impl Validation {
    fn accepted(change: StateChange, delta: StateDelta) -> Self {
        Self {
            change,
            delta: Some(delta),
        }
    }

    fn unchanged(change: StateChange) -> Self {
        Self {
            change: change.unchanged(),
            delta: None,
        }
    }

    fn rejected(change: StateChange, reason: impl Into<String>) -> Self {
        Self {
            change: change.reject(reason),
            delta: None,
        }
    }
}

/// Decide whether `invocation` is legal against `session` and what it would do.
pub fn validate(session: &GameSession, invocation: &ToolInvocation) -> Validation {
    match invocation {
        ToolInvocation::UpdatePlayerHp {
            player,
            delta,
            reason,
        } => validate_hp(session, player, *delta, reason.clone()),
        ToolInvocation::UpdatePlayerMp {
            player,
            delta,
            reason,
        } => validate_mp(session, player, *delta, reason.clone()),
        ToolInvocation::ApplyStatusEffect { player, effect } => {
            validate_effect(session, invocation.name(), player, effect, true)
        }
        ToolInvocation::RemoveStatusEffect { player, effect } => {
            validate_effect(session, invocation.name(), player, effect, false)
        }
        ToolInvocation::UpdatePlayerResource {
            player,
            resource,
            delta,
            reason,
        } => validate_resource(session, player, resource, *delta, reason.clone()),
        ToolInvocation::ApplyGlobalEffect { effect } => {
            validate_global_effect(session, invocation.name(), effect, true)
        }
        ToolInvocation::RemoveGlobalEffect { effect } => {
            validate_global_effect(session, invocation.name(), effect, false)
        }
        ToolInvocation::NextRound { next_player } => {
            validate_next_round(session, next_player.as_deref())
        }
        ToolInvocation::Malformed { name, error } => Validation::rejected(
            StateChange::new(name.as_str(), kind_for_tool(name)),
            format!("invalid arguments: {error}"),
        ),
        ToolInvocation::Unrecognized { name } => Validation::rejected(
            StateChange::new(name.as_str(), ChangeKind::Unrecognized),
            UNRECOGNIZED_ACTION,
        ),
    }
}

fn kind_for_tool(name: &str) -> ChangeKind {
    use crate::tools::{
        APPLY_GLOBAL_EFFECT, APPLY_STATUS_EFFECT, NEXT_ROUND, REMOVE_GLOBAL_EFFECT,
        REMOVE_STATUS_EFFECT, UPDATE_PLAYER_HP, UPDATE_PLAYER_MP, UPDATE_PLAYER_RESOURCE,
    };
    match name {
        UPDATE_PLAYER_HP => ChangeKind::Health,
        UPDATE_PLAYER_MP => ChangeKind::Mana,
        APPLY_STATUS_EFFECT => ChangeKind::EffectAdded,
        REMOVE_STATUS_EFFECT => ChangeKind::EffectRemoved,
        APPLY_GLOBAL_EFFECT => ChangeKind::GlobalEffectAdded,
        REMOVE_GLOBAL_EFFECT => ChangeKind::GlobalEffectRemoved,
        UPDATE_PLAYER_RESOURCE => ChangeKind::Resource,
        NEXT_ROUND => ChangeKind::RoundAdvance,
        _ => ChangeKind::Unrecognized,
    }
}

/// Resolve a model-supplied name to a player index, or produce the rejection.
fn resolve_player(session: &GameSession, raw: &str) -> Result<usize, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("invalid arguments: player name is blank".to_string());
    }
    session
        .player_index(name)
        .ok_or_else(|| format!("unknown player '{name}'"))
}

fn validate_hp(
    session: &GameSession,
    player: &str,
    delta: i64,
    reason: Option<String>,
) -> Validation {
    let change = StateChange::new(crate::tools::UPDATE_PLAYER_HP, ChangeKind::Health)
        .target(player.trim())
        .magnitude(delta)
        .reason(reason);

    let index = match resolve_player(session, player) {
        Ok(index) => index,
        Err(reason) => return Validation::rejected(change, reason),
    };
    let Some(target) = session.players().get(index) else {
        return Validation::rejected(change, format!("unknown player '{}'", player.trim()));
    };

    let before = target.hp();
    let (after, description) =
        clamped_step(target.name().as_str(), "hp", before, target.max_hp(), delta);
    let change = change
        .values(i64::from(before), i64::from(after))
        .describe(description);

    if before == after {
        return Validation::unchanged(change);
    }
    Validation::accepted(
        change,
        StateDelta::SetHp {
            player: index,
            hp: after,
        },
    )
}

fn validate_mp(
    session: &GameSession,
    player: &str,
    delta: i64,
    reason: Option<String>,
) -> Validation {
    let change = StateChange::new(crate::tools::UPDATE_PLAYER_MP, ChangeKind::Mana)
        .target(player.trim())
        .magnitude(delta)
        .reason(reason);

    let index = match resolve_player(session, player) {
        Ok(index) => index,
        Err(reason) => return Validation::rejected(change, reason),
    };
    let Some(target) = session.players().get(index) else {
        return Validation::rejected(change, format!("unknown player '{}'", player.trim()));
    };
    let Some(pool) = target.mana() else {
        return Validation::rejected(change, format!("{} has no mana pool", target.name()));
    };

    let before = pool.mp;
    let (after, description) =
        clamped_step(target.name().as_str(), "mp", before, pool.max_mp, delta);
    let change = change
        .values(i64::from(before), i64::from(after))
        .describe(description);

    if before == after {
        return Validation::unchanged(change);
    }
    Validation::accepted(
        change,
        StateDelta::SetMp {
            player: index,
            mp: after,
        },
    )
}

/// Add `delta` to a pool value, clamp into `0..=max`, and describe the step.
fn clamped_step(name: &str, pool: &str, before: i32, max: i32, delta: i64) -> (i32, String) {
    let raw = i64::from(before).saturating_add(delta);
    let clamped = raw.clamp(0, i64::from(max));
    // clamp bounds are i32 values, so the conversion cannot fail
    let after = i32::try_from(clamped).unwrap_or(before);

    let mut description = format!("{name} {pool} {before} -> {after} ({delta:+})");
    if clamped != raw {
        description.push_str(&format!(", clamped from {raw}"));
    }
    (after, description)
}

fn validate_global_effect(
    session: &GameSession,
    action: &str,
    effect: &str,
    adding: bool,
) -> Validation {
    let kind = if adding {
        ChangeKind::GlobalEffectAdded
    } else {
        ChangeKind::GlobalEffectRemoved
    };
    let effect = effect.trim();
    let change = StateChange::new(action, kind).label(effect);
    if effect.is_empty() {
        return Validation::rejected(change, "invalid arguments: effect is blank");
    }

    match (adding, session.has_global_effect(effect)) {
        (true, true) => {
            Validation::unchanged(change.describe(format!("{effect} is already in effect")))
        }
        (false, false) => {
            Validation::unchanged(change.describe(format!("{effect} is not in effect")))
        }
        (true, false) => Validation::accepted(
            change.describe(format!("{effect} takes effect for everyone")),
            StateDelta::AddGlobalEffect {
                effect: effect.to_string(),
            },
        ),
        (false, true) => Validation::accepted(
            change.describe(format!("{effect} ends")),
            StateDelta::RemoveGlobalEffect {
                effect: effect.to_string(),
            },
        ),
    }
}

fn validate_effect(
    session: &GameSession,
    action: &str,
    player: &str,
    effect: &str,
    adding: bool,
) -> Validation {
    let kind = if adding {
        ChangeKind::EffectAdded
    } else {
        ChangeKind::EffectRemoved
    };
    let effect = effect.trim();
    let change = StateChange::new(action, kind)
        .target(player.trim())
        .label(effect);

    let index = match resolve_player(session, player) {
        Ok(index) => index,
        Err(reason) => return Validation::rejected(change, reason),
    };
    if effect.is_empty() {
        return Validation::rejected(change, "invalid arguments: effect is blank");
    }
    let Some(target) = session.players().get(index) else {
        return Validation::rejected(change, format!("unknown player '{}'", player.trim()));
    };

    let present = target.has_effect(effect);
    match (adding, present) {
        (true, true) => Validation::unchanged(
            change.describe(format!("{} already has {}", target.name(), effect)),
        ),
        (false, false) => Validation::unchanged(
            change.describe(format!("{} does not have {}", target.name(), effect)),
        ),
        (true, false) => Validation::accepted(
            change.describe(format!("{} gains {}", target.name(), effect)),
            StateDelta::AddEffect {
                player: index,
                effect: effect.to_string(),
            },
        ),
        (false, true) => Validation::accepted(
            change.describe(format!("{} loses {}", target.name(), effect)),
            StateDelta::RemoveEffect {
                player: index,
                effect: effect.to_string(),
            },
        ),
    }
}

fn validate_resource(
    session: &GameSession,
    player: &str,
    resource: &str,
    delta: i64,
    reason: Option<String>,
) -> Validation {
    let resource = resource.trim();
    let change = StateChange::new(crate::tools::UPDATE_PLAYER_RESOURCE, ChangeKind::Resource)
        .target(player.trim())
        .label(resource)
        .magnitude(delta)
        .reason(reason);

    let index = match resolve_player(session, player) {
        Ok(index) => index,
        Err(reason) => return Validation::rejected(change, reason),
    };
    if resource.is_empty() {
        return Validation::rejected(change, "invalid arguments: resource name is blank");
    }
    let Some(target) = session.players().get(index) else {
        return Validation::rejected(change, format!("unknown player '{}'", player.trim()));
    };

    let before = target.resource(resource);
    let Some(after) = before.checked_add(delta) else {
        return Validation::rejected(change, format!("{resource} would overflow"));
    };
    if after < 0 && !target.allows_negative(resource) {
        return Validation::rejected(
            change.values(before, before),
            format!("insufficient {resource}: has {before}, change {delta:+}"),
        );
    }

    let change = change.values(before, after).describe(format!(
        "{} {} {} -> {} ({:+})",
        target.name(),
        resource,
        before,
        after,
        delta
    ));
    if delta == 0 {
        return Validation::unchanged(change);
    }
    Validation::accepted(
        change,
        StateDelta::SetResource {
            player: index,
            resource: resource.to_string(),
            quantity: after,
        },
    )
}

fn validate_next_round(session: &GameSession, next_player: Option<&str>) -> Validation {
    let mut change = StateChange::new(crate::tools::NEXT_ROUND, ChangeKind::RoundAdvance);
    let current = session.current_player_index();
    let count = session.players().len();

    let target = match next_player {
        None => (current + 1) % count.max(1),
        Some(name) => {
            change = change.target(name.trim());
            match resolve_player(session, name) {
                Ok(index) => index,
                Err(reason) => return Validation::rejected(change, reason),
            }
        }
    };

    // A new round starts whenever the turn lands on the first seat.
    let before = session.round();
    let after = if target == 0 {
        before.saturating_add(1)
    } else {
        before
    };

    let Some(next) = session.players().get(target) else {
        return Validation::rejected(change, "invalid arguments: no players to rotate to");
    };
    let mut description = format!("Turn passes to {}", next.name());
    if after != before {
        description.push_str(&format!(", round {after} begins"));
    }

    let change = change
        .target(next.name().as_str())
        .values(i64::from(before), i64::from(after))
        .describe(description);
    Validation::accepted(
        change,
        StateDelta::SetTurn {
            current_player: target,
            round: after,
        },
    )
}
