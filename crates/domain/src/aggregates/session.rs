//! GameSession aggregate - one live table: players, turn order, transcript
//!
//! # Invariants
//!
//! - at least one player; player names are unique
//! - player order is fixed at creation and defines the turn rotation
//! - `current_player` always names a player in the session
//! - `round >= 1`
//! - global effects form a set and apply to the whole table
//! - transcript and state live in the same record, so a persisted snapshot
//!   never shows one without the other

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerSpec};
use crate::error::DomainError;
use crate::ids::SessionId;
use crate::value_objects::{BoundedLog, GameId, PlayerName, TranscriptTurn};

/// How much history a session keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Question/answer turns retained for prompt context.
    pub transcript_turns: usize,
    /// Human-readable change lines retained.
    pub action_log_entries: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            transcript_turns: 10,
            action_log_entries: 200,
        }
    }
}

/// Listing view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub game_id: GameId,
    pub round: u32,
    pub current_player: PlayerName,
    pub player_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    id: SessionId,
    game_id: GameId,
    players: Vec<Player>,
    round: u32,
    current_player: PlayerName,
    #[serde(default)]
    global_effects: BTreeSet<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    transcript: BoundedLog<TranscriptTurn>,
    action_log: BoundedLog<String>,
    /// Bumped on every persisted write; the store compares it to detect races.
    version: u64,
}

impl GameSession {
    /// Create a session with round 1 and the first player to act.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` for an empty player list or an invalid spec
    /// - `DomainError::DuplicatePlayerName` if two specs share a name
    pub fn new(
        game_id: GameId,
        specs: Vec<PlayerSpec>,
        limits: SessionLimits,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(specs.len());
        for spec in specs {
            let player = Player::from_spec(spec)?;
            if !seen.insert(player.name().clone()) {
                return Err(DomainError::duplicate_player(player.name().as_str()));
            }
            players.push(player);
        }

        let Some(first) = players.first() else {
            return Err(DomainError::validation(
                "A session needs at least one player",
            ));
        };
        let current_player = first.name().clone();
        let mut action_log = BoundedLog::new(limits.action_log_entries);
        action_log.push(format!(
            "Session created for {}: players {}",
            game_id,
            players
                .iter()
                .map(|p| p.name().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        Ok(Self {
            id: SessionId::new(),
            game_id,
            players,
            round: 1,
            current_player,
            global_effects: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            transcript: BoundedLog::new(limits.transcript_turns),
            action_log,
            version: 0,
        })
    }

    /// Replace the generated ID (used when restoring a known session).
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    pub fn player_index(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name() == name)
    }

    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[inline]
    pub fn current_player(&self) -> &PlayerName {
        &self.current_player
    }

    pub fn current_player_index(&self) -> usize {
        self.player_index(self.current_player.as_str()).unwrap_or(0)
    }

    /// Effects on the whole table, e.g. "double damage round".
    pub fn global_effects(&self) -> &BTreeSet<String> {
        &self.global_effects
    }

    pub fn has_global_effect(&self, effect: &str) -> bool {
        self.global_effects.contains(effect)
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn transcript(&self) -> &BoundedLog<TranscriptTurn> {
        &self.transcript
    }

    pub fn action_log(&self) -> &BoundedLog<String> {
        &self.action_log
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            game_id: self.game_id.clone(),
            round: self.round,
            current_player: self.current_player.clone(),
            player_count: self.players.len(),
            created_at: self.created_at,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append a question/answer exchange. Callers persist it in the same write
    /// as the state changes the answer produced.
    pub fn record_turn(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.transcript.push(TranscriptTurn {
            question: question.into(),
            answer: answer.into(),
            asked_at: now,
        });
        self.updated_at = now;
    }

    /// Restore every player to creation-time values, round 1, first player to
    /// act, no global effects, empty transcript. Identity and the player set
    /// survive.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        for player in &mut self.players {
            player.reset();
        }
        self.round = 1;
        if let Some(first) = self.players.first() {
            self.current_player = first.name().clone();
        }
        self.global_effects.clear();
        self.transcript.clear();
        self.action_log.push("Session reset".to_string());
        self.updated_at = now;
    }

    /// Advance the version ahead of a compare-and-swap write.
    pub fn bump_version(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }

    pub(crate) fn player_at_mut(&mut self, index: usize) -> Option<&mut Player> {
        self.players.get_mut(index)
    }

    pub(crate) fn set_turn(&mut self, current_index: usize, round: u32) {
        if let Some(player) = self.players.get(current_index) {
            self.current_player = player.name().clone();
            self.round = round.max(1);
        }
    }

    /// Returns false if the effect was already active.
    pub(crate) fn insert_global_effect(&mut self, effect: String) -> bool {
        self.global_effects.insert(effect)
    }

    /// Returns false if the effect was not active.
    pub(crate) fn remove_global_effect(&mut self, effect: &str) -> bool {
        self.global_effects.remove(effect)
    }

    pub(crate) fn push_log(&mut self, line: String) {
        self.action_log.push(line);
    }

    /// Check every session and player invariant.
    pub fn invariants_hold(&self) -> bool {
        !self.players.is_empty()
            && self.round >= 1
            && self.player(self.current_player.as_str()).is_some()
            && self.players.iter().all(Player::invariants_hold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn game() -> GameId {
        GameId::new("Catan").unwrap()
    }

    #[test]
    fn new_session_starts_at_round_one_with_first_player() {
        let session = GameSession::new(
            game(),
            vec![PlayerSpec::new("Alice", 10), PlayerSpec::new("Bob", 12)],
            SessionLimits::default(),
            fixed_time(),
        )
        .unwrap();

        assert_eq!(session.round(), 1);
        assert_eq!(session.current_player().as_str(), "Alice");
        assert_eq!(session.players().len(), 2);
        assert_eq!(session.version(), 0);
        assert!(session.transcript().is_empty());
        assert!(session.invariants_hold());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = GameSession::new(
            game(),
            vec![PlayerSpec::new("Alice", 10), PlayerSpec::new(" Alice ", 12)],
            SessionLimits::default(),
            fixed_time(),
        )
        .unwrap_err();

        assert_eq!(err, DomainError::DuplicatePlayerName("Alice".into()));
    }

    #[test]
    fn empty_player_list_is_rejected() {
        let err =
            GameSession::new(game(), vec![], SessionLimits::default(), fixed_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn transcript_is_bounded() {
        let limits = SessionLimits {
            transcript_turns: 2,
            action_log_entries: 10,
        };
        let mut session =
            GameSession::new(game(), vec![PlayerSpec::new("Alice", 10)], limits, fixed_time())
                .unwrap();

        session.record_turn("q1", "a1", fixed_time());
        session.record_turn("q2", "a2", fixed_time());
        session.record_turn("q3", "a3", fixed_time());

        let questions: Vec<_> = session
            .transcript()
            .iter()
            .map(|t| t.question.as_str())
            .collect();
        assert_eq!(questions, vec!["q2", "q3"]);
    }

    #[test]
    fn reset_keeps_identity_and_clears_transcript() {
        let mut session = GameSession::new(
            game(),
            vec![PlayerSpec::new("Alice", 10), PlayerSpec::new("Bob", 12)],
            SessionLimits::default(),
            fixed_time(),
        )
        .unwrap();
        let id = session.id();
        session.record_turn("q", "a", fixed_time());
        session.set_turn(1, 4);
        session.insert_global_effect("blood moon".into());

        session.reset(fixed_time());

        assert_eq!(session.id(), id);
        assert!(session.global_effects().is_empty());
        assert_eq!(session.round(), 1);
        assert_eq!(session.current_player().as_str(), "Alice");
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn reset_of_a_playerless_record_does_not_panic() {
        let session = GameSession::new(
            game(),
            vec![PlayerSpec::new("Alice", 10)],
            SessionLimits::default(),
            fixed_time(),
        )
        .unwrap();
        let mut json = serde_json::to_value(&session).unwrap();
        json["players"] = serde_json::json!([]);
        let mut broken: GameSession = serde_json::from_value(json).unwrap();

        broken.reset(fixed_time());

        assert_eq!(broken.round(), 1);
        assert!(!broken.invariants_hold());
    }

    #[test]
    fn session_round_trips_through_json() {
        let session = GameSession::new(
            game(),
            vec![PlayerSpec::new("Alice", 10).with_resource("gold", 2)],
            SessionLimits::default(),
            fixed_time(),
        )
        .unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let restored: GameSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
