//! Session lifecycle end to end.

use rulewarden_domain::{ManualAdjustment, PlayerSpec};
use serde_json::json;

use super::*;
use crate::infrastructure::ports::LlmResponse;
use crate::use_cases::EngineError;

#[tokio::test]
async fn reset_restores_starting_state_and_clears_transcript() {
    let llm = ScriptedLlm::new().answer(
        "Alice buys a potion",
        LlmResponse::text("Potions cost 2 gold.")
            .with_tool_call("update_player_resource", json!({"player_name": "Alice", "resource_name": "gold", "delta": -2}))
            .with_tool_call("apply_status_effect", json!({"player_name": "Alice", "effect": "blessed"}))
            .with_tool_call("next_round", json!({})),
    );
    let app = build_app(llm, rulebook(), test_settings());
    let id = two_player_session(&app).await;
    app.rule(id, "Alice buys a potion").await.unwrap();

    app.reset_session(id).await.unwrap();

    let session = app.get_session(id).await.unwrap();
    let alice = session.player("Alice").unwrap();
    assert_eq!(session.id(), id);
    assert_eq!(session.round(), 1);
    assert_eq!(session.current_player().as_str(), "Alice");
    assert!(session.transcript().is_empty());
    assert_eq!(alice.resource("gold"), 3);
    assert!(alice.status_effects().is_empty());
    assert_eq!(session.players().len(), 2);
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let app = build_app(ScriptedLlm::new(), rulebook(), test_settings());
    let id = two_player_session(&app).await;

    app.delete_session(id).await.unwrap();

    assert!(matches!(
        app.get_session(id).await.unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
    assert!(matches!(
        app.rule(id, "Who goes first?").await.unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
    assert!(matches!(
        app.delete_session(id).await.unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
}

#[tokio::test]
async fn list_shows_every_live_session() {
    let app = build_app(ScriptedLlm::new(), rulebook(), test_settings());
    let first = two_player_session(&app).await;
    let second = app
        .create_session("Catan", vec![PlayerSpec::new("Cara", 1)])
        .await
        .unwrap();
    app.advance_round(second).await.unwrap();

    let summaries = app.list_sessions().await.unwrap();

    assert_eq!(summaries.len(), 2);
    let catan = summaries.iter().find(|s| s.id == second).unwrap();
    assert_eq!(catan.round, 2);
    assert_eq!(catan.player_count, 1);
    assert!(summaries.iter().any(|s| s.id == first));
}

#[tokio::test]
async fn duplicate_players_are_refused() {
    let app = build_app(ScriptedLlm::new(), rulebook(), test_settings());

    let err = app
        .create_session(GAME, vec![PlayerSpec::new("Alice", 5), PlayerSpec::new("Alice", 7)])
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::DuplicatePlayerName(name) if name == "Alice"));
    assert!(app.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn hp_stays_in_range_under_repeated_adjustments() {
    let app = build_app(ScriptedLlm::new(), rulebook(), test_settings());
    let id = two_player_session(&app).await;

    for delta in [-15, -15, 40, -3] {
        app.manual_adjust(id, "Bob", ManualAdjustment::Hp { delta, reason: None })
            .await
            .unwrap();
    }

    let session = app.get_session(id).await.unwrap();
    assert_eq!(session.player("Bob").unwrap().hp(), 17);
    assert!(session.invariants_hold());
}

#[tokio::test]
async fn mana_and_global_effects_survive_rulings_and_reset_clears_them() {
    let llm = ScriptedLlm::new().answer(
        "Alice casts Frost Nova",
        LlmResponse::text("Frost Nova costs 4 mana and freezes the board [Passage 1].")
            .with_tool_call("update_player_mp", json!({"player_name": "Alice", "delta": -4, "reason": "Frost Nova"}))
            .with_tool_call("apply_global_effect", json!({"effect": "frozen ground"}))
            .with_tool_call("update_player_mp", json!({"player_name": "Bob", "delta": -1})),
    );
    let app = build_app(llm, rulebook(), test_settings());
    let id = app
        .create_session(
            GAME,
            vec![
                PlayerSpec::new("Alice", 20).with_mana(10).with_starting_mp(6),
                PlayerSpec::new("Bob", 20),
            ],
        )
        .await
        .unwrap();

    let result = app.rule(id, "Alice casts Frost Nova").await.unwrap();

    assert_eq!(result.applied_changes().count(), 2);
    assert_eq!(result.rejected_changes().count(), 1);
    let session = app.get_session(id).await.unwrap();
    assert_eq!(session.player("Alice").unwrap().mana().unwrap().mp, 2);
    assert!(session.has_global_effect("frozen ground"));

    app.set_global_effect(id, "frozen ground", false).await.unwrap();
    app.set_global_effect(id, "fog", true).await.unwrap();
    app.reset_session(id).await.unwrap();

    let session = app.get_session(id).await.unwrap();
    assert_eq!(session.player("Alice").unwrap().mana().unwrap().mp, 6);
    assert!(session.global_effects().is_empty());
}

#[tokio::test]
async fn players_can_start_downed_and_be_healed() {
    let app = build_app(ScriptedLlm::new(), rulebook(), test_settings());
    let id = app
        .create_session(
            GAME,
            vec![
                PlayerSpec::new("Alice", 20),
                PlayerSpec::new("Bob", 20).with_starting_hp(0),
            ],
        )
        .await
        .unwrap();

    app.manual_adjust(id, "Bob", ManualAdjustment::Hp { delta: 5, reason: None })
        .await
        .unwrap();
    app.reset_session(id).await.unwrap();

    let session = app.get_session(id).await.unwrap();
    assert_eq!(session.player("Bob").unwrap().hp(), 0);
    assert!(session.invariants_hold());
}
