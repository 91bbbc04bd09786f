//! Rulewarden domain: game sessions, tool invocations, and the rules that
//! keep session state consistent no matter what the model proposes.

pub mod aggregates;
pub mod error;
pub mod ids;
pub mod rules;
pub mod ruling;
pub mod state_change;
pub mod tools;
pub mod value_objects;

pub use aggregates::{
    GameSession, ManaPool, Player, PlayerSpec, SessionLimits, SessionSummary,
};
pub use error::DomainError;
pub use ids::SessionId;
pub use rules::{
    apply, apply_one, validate, StateDelta, Transition, Validation, UNRECOGNIZED_ACTION,
};
pub use ruling::{Citation, RulingResult};
pub use state_change::{ChangeKind, ChangeStatus, StateChange};
pub use tools::{ManualAdjustment, ToolInvocation, KNOWN_TOOLS};
pub use value_objects::{BoundedLog, GameId, PlayerName, TranscriptTurn};
