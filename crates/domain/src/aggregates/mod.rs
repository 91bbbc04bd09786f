//! Aggregates - consistency boundaries mutated only by the transition engine.

pub mod player;
pub mod session;

pub use player::{ManaPool, Player, PlayerSpec};
pub use session::{GameSession, SessionLimits, SessionSummary};
