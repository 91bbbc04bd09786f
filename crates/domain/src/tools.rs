//! Tool invocations proposed by the rules model (or by a human correcting
//! the table state).
//!
//! Model output is untrusted: raw `(name, arguments)` pairs are decoded into
//! `ToolInvocation` without ever failing. Unknown names become
//! `Unrecognized`; known names with bad arguments become `Malformed`. Both are
//! rejected by the validator so the caller still sees what was attempted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UPDATE_PLAYER_HP: &str = "update_player_hp";
pub const APPLY_STATUS_EFFECT: &str = "apply_status_effect";
pub const REMOVE_STATUS_EFFECT: &str = "remove_status_effect";
pub const UPDATE_PLAYER_RESOURCE: &str = "update_player_resource";
pub const NEXT_ROUND: &str = "next_round";
pub const UPDATE_PLAYER_MP: &str = "update_player_mp";
pub const APPLY_GLOBAL_EFFECT: &str = "apply_global_effect";
pub const REMOVE_GLOBAL_EFFECT: &str = "remove_global_effect";

/// Every tool name the engine understands, in schema order.
pub const KNOWN_TOOLS: [&str; 8] = [
    UPDATE_PLAYER_HP,
    APPLY_STATUS_EFFECT,
    REMOVE_STATUS_EFFECT,
    UPDATE_PLAYER_RESOURCE,
    NEXT_ROUND,
    UPDATE_PLAYER_MP,
    APPLY_GLOBAL_EFFECT,
    REMOVE_GLOBAL_EFFECT,
];

/// A proposed mutation of session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToolInvocation {
    /// Damage (negative delta) or healing (positive delta).
    UpdatePlayerHp {
        player: String,
        delta: i64,
        reason: Option<String>,
    },
    ApplyStatusEffect {
        player: String,
        effect: String,
    },
    RemoveStatusEffect {
        player: String,
        effect: String,
    },
    UpdatePlayerResource {
        player: String,
        resource: String,
        delta: i64,
        reason: Option<String>,
    },
    /// End the current player's turn. `next_player` jumps to a named player
    /// instead of rotating.
    NextRound {
        next_player: Option<String>,
    },
    /// Spend (negative delta) or restore mana.
    UpdatePlayerMp {
        player: String,
        delta: i64,
        reason: Option<String>,
    },
    ApplyGlobalEffect {
        effect: String,
    },
    RemoveGlobalEffect {
        effect: String,
    },
    /// A known tool whose arguments did not match its schema.
    Malformed {
        name: String,
        error: String,
    },
    /// A tool name the engine does not implement.
    Unrecognized {
        name: String,
    },
}

#[derive(Deserialize)]
struct HpArgs {
    #[serde(alias = "player_name")]
    player: String,
    delta: i64,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct EffectArgs {
    #[serde(alias = "player_name")]
    player: String,
    effect: String,
}

#[derive(Deserialize)]
struct ResourceArgs {
    #[serde(alias = "player_name")]
    player: String,
    #[serde(alias = "resource_name")]
    resource: String,
    delta: i64,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct GlobalEffectArgs {
    effect: String,
}

#[derive(Deserialize, Default)]
struct NextRoundArgs {
    #[serde(default)]
    next_player: Option<String>,
}

impl ToolInvocation {
    /// Decode a raw tool call. Never fails; see module docs.
    pub fn from_call(name: &str, arguments: &Value) -> Self {
        let name = name.trim();
        match name {
            UPDATE_PLAYER_HP => decode(name, arguments, |a: HpArgs| Self::UpdatePlayerHp {
                player: a.player,
                delta: a.delta,
                reason: non_blank(a.reason),
            }),
            APPLY_STATUS_EFFECT => decode(name, arguments, |a: EffectArgs| {
                Self::ApplyStatusEffect {
                    player: a.player,
                    effect: a.effect,
                }
            }),
            REMOVE_STATUS_EFFECT => decode(name, arguments, |a: EffectArgs| {
                Self::RemoveStatusEffect {
                    player: a.player,
                    effect: a.effect,
                }
            }),
            UPDATE_PLAYER_RESOURCE => decode(name, arguments, |a: ResourceArgs| {
                Self::UpdatePlayerResource {
                    player: a.player,
                    resource: a.resource,
                    delta: a.delta,
                    reason: non_blank(a.reason),
                }
            }),
            NEXT_ROUND => {
                // Models often send `null` or nothing for argument-less tools.
                if arguments.is_null() {
                    return Self::NextRound { next_player: None };
                }
                decode(name, arguments, |a: NextRoundArgs| Self::NextRound {
                    next_player: non_blank(a.next_player),
                })
            }
            UPDATE_PLAYER_MP => decode(name, arguments, |a: HpArgs| Self::UpdatePlayerMp {
                player: a.player,
                delta: a.delta,
                reason: non_blank(a.reason),
            }),
            APPLY_GLOBAL_EFFECT => decode(name, arguments, |a: GlobalEffectArgs| {
                Self::ApplyGlobalEffect { effect: a.effect }
            }),
            REMOVE_GLOBAL_EFFECT => decode(name, arguments, |a: GlobalEffectArgs| {
                Self::RemoveGlobalEffect { effect: a.effect }
            }),
            other => Self::Unrecognized {
                name: other.to_string(),
            },
        }
    }

    // =========================================================================
    // Constructors for callers that build invocations directly
    // =========================================================================

    pub fn update_hp(player: impl Into<String>, delta: i64) -> Self {
        Self::UpdatePlayerHp {
            player: player.into(),
            delta,
            reason: None,
        }
    }

    pub fn update_mp(player: impl Into<String>, delta: i64) -> Self {
        Self::UpdatePlayerMp {
            player: player.into(),
            delta,
            reason: None,
        }
    }

    pub fn apply_global_effect(effect: impl Into<String>) -> Self {
        Self::ApplyGlobalEffect {
            effect: effect.into(),
        }
    }

    pub fn remove_global_effect(effect: impl Into<String>) -> Self {
        Self::RemoveGlobalEffect {
            effect: effect.into(),
        }
    }

    pub fn apply_effect(player: impl Into<String>, effect: impl Into<String>) -> Self {
        Self::ApplyStatusEffect {
            player: player.into(),
            effect: effect.into(),
        }
    }

    pub fn remove_effect(player: impl Into<String>, effect: impl Into<String>) -> Self {
        Self::RemoveStatusEffect {
            player: player.into(),
            effect: effect.into(),
        }
    }

    pub fn update_resource(
        player: impl Into<String>,
        resource: impl Into<String>,
        delta: i64,
    ) -> Self {
        Self::UpdatePlayerResource {
            player: player.into(),
            resource: resource.into(),
            delta,
            reason: None,
        }
    }

    pub fn next_round() -> Self {
        Self::NextRound { next_player: None }
    }

    /// Attach a reason to hp, mp, and resource updates; other kinds ignore it.
    pub fn because(mut self, why: impl Into<String>) -> Self {
        match &mut self {
            Self::UpdatePlayerHp { reason, .. }
            | Self::UpdatePlayerMp { reason, .. }
            | Self::UpdatePlayerResource { reason, .. } => {
                *reason = Some(why.into());
            }
            _ => {}
        }
        self
    }

    /// The tool name this invocation corresponds to.
    pub fn name(&self) -> &str {
        match self {
            Self::UpdatePlayerHp { .. } => UPDATE_PLAYER_HP,
            Self::ApplyStatusEffect { .. } => APPLY_STATUS_EFFECT,
            Self::RemoveStatusEffect { .. } => REMOVE_STATUS_EFFECT,
            Self::UpdatePlayerResource { .. } => UPDATE_PLAYER_RESOURCE,
            Self::NextRound { .. } => NEXT_ROUND,
            Self::UpdatePlayerMp { .. } => UPDATE_PLAYER_MP,
            Self::ApplyGlobalEffect { .. } => APPLY_GLOBAL_EFFECT,
            Self::RemoveGlobalEffect { .. } => REMOVE_GLOBAL_EFFECT,
            Self::Malformed { name, .. } | Self::Unrecognized { name } => name,
        }
    }

    /// The targeted player, for kinds that target one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::UpdatePlayerHp { player, .. }
            | Self::UpdatePlayerMp { player, .. }
            | Self::ApplyStatusEffect { player, .. }
            | Self::RemoveStatusEffect { player, .. }
            | Self::UpdatePlayerResource { player, .. } => Some(player.trim()),
            Self::NextRound { next_player } => next_player.as_deref().map(str::trim),
            Self::ApplyGlobalEffect { .. }
            | Self::RemoveGlobalEffect { .. }
            | Self::Malformed { .. }
            | Self::Unrecognized { .. } => None,
        }
    }
}

/// A human correction aimed at one player, bypassing the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManualAdjustment {
    Hp {
        delta: i64,
        #[serde(default)]
        reason: Option<String>,
    },
    Mp {
        delta: i64,
        #[serde(default)]
        reason: Option<String>,
    },
    AddEffect {
        effect: String,
    },
    RemoveEffect {
        effect: String,
    },
    Resource {
        resource: String,
        delta: i64,
        #[serde(default)]
        reason: Option<String>,
    },
    /// Hand the turn to this player.
    PassTurn,
}

impl ManualAdjustment {
    pub fn into_invocation(self, player: impl Into<String>) -> ToolInvocation {
        let player = player.into();
        match self {
            Self::Hp { delta, reason } => ToolInvocation::UpdatePlayerHp {
                player,
                delta,
                reason,
            },
            Self::Mp { delta, reason } => ToolInvocation::UpdatePlayerMp {
                player,
                delta,
                reason,
            },
            Self::AddEffect { effect } => ToolInvocation::ApplyStatusEffect { player, effect },
            Self::RemoveEffect { effect } => ToolInvocation::RemoveStatusEffect { player, effect },
            Self::Resource {
                resource,
                delta,
                reason,
            } => ToolInvocation::UpdatePlayerResource {
                player,
                resource,
                delta,
                reason,
            },
            Self::PassTurn => ToolInvocation::NextRound {
                next_player: Some(player),
            },
        }
    }
}

fn decode<A, F>(name: &str, arguments: &Value, build: F) -> ToolInvocation
where
    A: DeserializeOwned,
    F: FnOnce(A) -> ToolInvocation,
{
    match serde_json::from_value::<A>(arguments.clone()) {
        Ok(args) => build(args),
        Err(e) => ToolInvocation::Malformed {
            name: name.to_string(),
            error: e.to_string(),
        },
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
