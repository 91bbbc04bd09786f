//! Prompt assembly for a ruling.
//!
//! Layout: system instructions, then the retrieved passages tagged with their
//! locators, then the session state, all in the system message. The recent
//! transcript follows as alternating user/assistant messages, and the question
//! comes last.

use rulewarden_domain::{GameSession, Player};

use crate::infrastructure::ports::{ChatMessage, LlmRequest, Passage};

pub const SYSTEM_PROMPT: &str = "You are a precise tabletop game rules referee.

1. Rule on the players' question using only the rule passages provided.
2. Support every ruling by citing the passage it relies on, e.g. [Passage 2].
3. If the ruling changes the game state (damage, healing, mana, effects on a player or on everyone, resources, turn order), call the matching function for each change. Use player names exactly as listed in the game state.
4. If the passages do not cover the question, say plainly that the rulebook has no matching rule.

Answer with the ruling first, then the supporting rule text, then any state changes you made.
If a rule is ambiguous, give the most reasonable reading and explain why.";

/// Used when the model returns tool calls with no answer text.
pub const EMPTY_ANSWER_PLACEHOLDER: &str = "(The referee returned no answer text.)";

const NO_PASSAGES_NOTICE: &str = "No rule passages matched this question. Answer cautiously and \
tell the players the rulebook may be missing the relevant rule.";

pub fn build_request(
    session: &GameSession,
    passages: &[Passage],
    question: &str,
    max_history_turns: usize,
) -> LlmRequest {
    let mut system = String::from(SYSTEM_PROMPT);
    system.push_str("\n\n");
    system.push_str(&passage_context(passages));
    system.push_str("\n\n");
    system.push_str(&state_summary(session));

    let mut messages = Vec::with_capacity(max_history_turns * 2 + 1);
    for turn in session.transcript().recent(max_history_turns) {
        messages.push(ChatMessage::user(turn.question.as_str()));
        messages.push(ChatMessage::assistant(turn.answer.as_str()));
    }
    messages.push(ChatMessage::user(question));

    LlmRequest::new(messages).with_system_prompt(system)
}

fn passage_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return NO_PASSAGES_NOTICE.to_string();
    }

    let mut lines = vec!["--- Rule passages ---".to_string()];
    for (i, passage) in passages.iter().enumerate() {
        lines.push(match &passage.locator {
            Some(locator) => format!("[Passage {}: {}]", i + 1, locator),
            None => format!("[Passage {}]", i + 1),
        });
        lines.push(passage.text.clone());
    }
    lines.push("--- End of rule passages ---".to_string());
    lines.join("\n")
}

/// Plain-text snapshot so the model can reason about current values.
pub fn state_summary(session: &GameSession) -> String {
    let mut lines = vec![
        "--- Game state ---".to_string(),
        format!("Game: {}", session.game_id()),
        format!("Round: {}", session.round()),
        format!("Current player: {}", session.current_player()),
        "Players:".to_string(),
    ];
    lines.extend(session.players().iter().map(player_line));
    if !session.global_effects().is_empty() {
        let effects: Vec<&str> = session.global_effects().iter().map(String::as_str).collect();
        lines.push(format!("Global effects: {}", effects.join(", ")));
    }
    lines.push("--- End of game state ---".to_string());
    lines.join("\n")
}

fn player_line(player: &Player) -> String {
    let mut line = format!("  - {}: HP {}/{}", player.name(), player.hp(), player.max_hp());
    if let Some(mana) = player.mana() {
        line.push_str(&format!(", MP {}/{}", mana.mp, mana.max_mp));
    }
    if player.status_effects().is_empty() {
        line.push_str(", effects: none");
    } else {
        let effects: Vec<&str> = player.status_effects().iter().map(String::as_str).collect();
        line.push_str(&format!(", effects: {}", effects.join(", ")));
    }
    if !player.resources().is_empty() {
        let resources: Vec<String> = player
            .resources()
            .iter()
            .map(|(name, qty)| format!("{name}:{qty}"))
            .collect();
        line.push_str(&format!(", resources: {}", resources.join(", ")));
    }
    line
}
