//! Rule Question use case.
//!
//! One question in, one ruling out: retrieve passages, ask the model with the
//! tool schema attached, run the proposed changes through the transition
//! engine, and persist state plus transcript in a single write. The session
//! lock is held from load to persist.

use std::sync::Arc;
use std::time::Duration;

use rulewarden_domain::{
    apply, Citation, GameSession, RulingResult, SessionId, ToolInvocation, Transition,
};

use super::prompt::{build_request, EMPTY_ANSWER_PLACEHOLDER};
use super::tool_schema::tool_definitions;
use crate::infrastructure::ports::{
    ClockPort, LlmPort, LlmResponse, Passage, RetrievalPort, SessionStore,
};
use crate::infrastructure::settings::EngineSettings;
use crate::use_cases::commit::commit;
use crate::use_cases::error::EngineError;
use crate::use_cases::gate::SessionGate;

/// Knobs for a single ruling.
#[derive(Debug, Clone)]
pub struct RulingConfig {
    pub retrieval_top_k: usize,
    pub max_history_turns: usize,
    /// Covers retrieval plus the model call.
    pub deadline: Duration,
    pub temperature: Option<f32>,
}

impl Default for RulingConfig {
    fn default() -> Self {
        Self {
            retrieval_top_k: 5,
            max_history_turns: 10,
            deadline: Duration::from_secs(120),
            temperature: Some(0.2),
        }
    }
}

impl From<&EngineSettings> for RulingConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            retrieval_top_k: settings.retrieval_top_k,
            max_history_turns: settings.max_history_turns,
            deadline: settings.ruling_deadline(),
            temperature: settings.llm.temperature,
        }
    }
}

pub struct RuleQuestion {
    store: Arc<dyn SessionStore>,
    retriever: Arc<dyn RetrievalPort>,
    llm: Arc<dyn LlmPort>,
    clock: Arc<dyn ClockPort>,
    gate: SessionGate,
    config: RulingConfig,
}

impl RuleQuestion {
    pub fn new(
        store: Arc<dyn SessionStore>,
        retriever: Arc<dyn RetrievalPort>,
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
        gate: SessionGate,
        config: RulingConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            llm,
            clock,
            gate,
            config,
        }
    }

    pub async fn execute(
        &self,
        id: SessionId,
        question: &str,
    ) -> Result<RulingResult, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::EmptyQuestion);
        }

        let (_guard, snapshot) = self.gate.open(self.store.as_ref(), id).await?;

        let (passages, response) =
            match tokio::time::timeout(self.config.deadline, self.consult(&snapshot, question))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!(
                        session_id = %id,
                        deadline_secs = self.config.deadline.as_secs(),
                        "Ruling deadline passed before the model answered"
                    );
                    return Err(EngineError::UpstreamUnavailable(format!(
                        "no ruling within {:?}",
                        self.config.deadline
                    )));
                }
            };

        let invocations: Vec<ToolInvocation> = response
            .tool_calls
            .iter()
            .map(|call| ToolInvocation::from_call(&call.name, &call.arguments))
            .collect();

        let answer = if response.content.trim().is_empty() {
            EMPTY_ANSWER_PLACEHOLDER.to_string()
        } else {
            response.content
        };

        let changes = commit(
            self.store.as_ref(),
            self.clock.as_ref(),
            snapshot,
            |base, now| {
                let Transition {
                    mut session,
                    changes,
                } = apply(base, &invocations);
                session.record_turn(question, answer.as_str(), now);
                (session, changes)
            },
        )
        .await?;

        for change in &changes {
            match change.status.rejection_reason() {
                Some(reason) => tracing::warn!(
                    session_id = %id,
                    action = %change.action,
                    reason,
                    "Model proposed a change that was rejected"
                ),
                None => tracing::debug!(session_id = %id, change = %change.description, "Change applied"),
            }
        }

        let result = RulingResult {
            answer,
            weak_grounding: passages.is_empty(),
            citations: passages.into_iter().map(citation).collect(),
            changes,
        };
        tracing::info!(
            session_id = %id,
            citations = result.citations.len(),
            applied = result.applied_changes().count(),
            rejected = result.rejected_changes().count(),
            weak_grounding = result.weak_grounding,
            "Ruling complete"
        );
        Ok(result)
    }

    /// Retrieval and the model call; everything the deadline covers.
    async fn consult(
        &self,
        session: &GameSession,
        question: &str,
    ) -> Result<(Vec<Passage>, LlmResponse), EngineError> {
        let mut passages = self
            .retriever
            .search(session.game_id(), question, self.config.retrieval_top_k)
            .await?;
        if passages.len() > self.config.retrieval_top_k {
            tracing::debug!(
                returned = passages.len(),
                top_k = self.config.retrieval_top_k,
                "Retriever over-delivered, keeping the closest passages"
            );
            passages.truncate(self.config.retrieval_top_k);
        }
        if passages.is_empty() {
            tracing::info!(
                session_id = %session.id(),
                game_id = %session.game_id(),
                "No rule passages found, answering with weak grounding"
            );
        }

        let mut request = build_request(
            session,
            &passages,
            question,
            self.config.max_history_turns,
        );
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self
            .llm
            .generate_with_tools(request, tool_definitions())
            .await?;
        Ok((passages, response))
    }
}

fn citation(passage: Passage) -> Citation {
    Citation {
        text: passage.text,
        locator: passage.locator,
        score: passage.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory_store::InMemorySessionStore;
    use crate::infrastructure::ports::{LlmError, MockLlmPort, MockRetrievalPort, RetrievalError};
    use crate::stores::{BusyPolicy, SessionLocks};
    use chrono::{TimeZone, Utc};
    use rulewarden_domain::{GameId, PlayerSpec, SessionLimits};
    use serde_json::json;

    fn session() -> GameSession {
        GameSession::new(
            GameId::new("Dungeon Duel").unwrap(),
            vec![PlayerSpec::new("Alice", 20), PlayerSpec::new("Bob", 15)],
            SessionLimits::default(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
        .unwrap()
    }

    async fn stored(store: &InMemorySessionStore) -> GameSession {
        let s = session();
        store.insert(&s).await.unwrap();
        s
    }

    fn use_case(
        store: Arc<InMemorySessionStore>,
        retriever: MockRetrievalPort,
        llm: MockLlmPort,
        config: RulingConfig,
    ) -> RuleQuestion {
        RuleQuestion::new(
            store,
            Arc::new(retriever),
            Arc::new(llm),
            Arc::new(FixedClock(Utc.timestamp_opt(1_700_000_100, 0).unwrap())),
            SessionGate::new(Arc::new(SessionLocks::new()), BusyPolicy::Queue),
            config,
        )
    }

    fn strike_passages() -> MockRetrievalPort {
        let mut retriever = MockRetrievalPort::new();
        retriever.expect_search().returning(|_, _, _| {
            Ok(vec![
                Passage::new("A Strike card deals 5 damage.").at("p. 4").scored(0.91),
                Passage::new("Damage never reduces health below 0."),
            ])
        });
        retriever
    }

    #[tokio::test]
    async fn ruling_applies_changes_and_records_transcript() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools().times(1).returning(|request, tools| {
            assert_eq!(tools.len(), 8);
            assert!(request.system_prompt.unwrap().contains("[Passage 1: p. 4]"));
            Ok(LlmResponse::text("Bob takes 5 damage [Passage 1].").with_tool_call(
                "update_player_hp",
                json!({"player_name": "Bob", "delta": -5, "reason": "Strike"}),
            ))
        });

        let rule = use_case(store.clone(), strike_passages(), llm, RulingConfig::default());
        let result = rule
            .execute(s.id(), "Alice plays Strike on Bob. What happens?")
            .await
            .unwrap();

        assert_eq!(result.answer, "Bob takes 5 damage [Passage 1].");
        assert!(!result.weak_grounding);
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.citations[0].locator.as_deref(), Some("p. 4"));
        assert_eq!(result.citations[0].score, Some(0.91));
        assert_eq!(result.applied_changes().count(), 1);

        let after = store.get(s.id()).await.unwrap().unwrap();
        assert_eq!(after.player("Bob").unwrap().hp(), 10);
        assert_eq!(after.transcript().len(), 1);
        assert_eq!(after.version(), 1);
    }

    #[tokio::test]
    async fn rejected_and_unknown_calls_are_reported_not_applied() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools().returning(|_, _| {
            Ok(LlmResponse::text("Nothing happens.")
                .with_tool_call("teleport_player", json!({"player_name": "Bob"}))
                .with_tool_call("update_player_hp", json!({"player_name": "Zed", "delta": -1})))
        });

        let rule = use_case(store.clone(), strike_passages(), llm, RulingConfig::default());
        let result = rule.execute(s.id(), "Can I teleport?").await.unwrap();

        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.rejected_changes().count(), 2);

        // Transcript still records the exchange; player state is untouched.
        let after = store.get(s.id()).await.unwrap().unwrap();
        assert_eq!(after.player("Bob").unwrap().hp(), 15);
        assert_eq!(after.transcript().len(), 1);
    }

    #[tokio::test]
    async fn empty_answer_gets_placeholder() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools()
            .returning(|_, _| Ok(LlmResponse::text("   ").with_tool_call("next_round", json!({}))));

        let rule = use_case(store.clone(), strike_passages(), llm, RulingConfig::default());
        let result = rule.execute(s.id(), "End my turn").await.unwrap();

        assert_eq!(result.answer, EMPTY_ANSWER_PLACEHOLDER);
        let after = store.get(s.id()).await.unwrap().unwrap();
        assert_eq!(after.current_player().as_str(), "Bob");
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_io() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut retriever = MockRetrievalPort::new();
        retriever.expect_search().never();
        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools().never();

        let rule = use_case(store, retriever, llm, RulingConfig::default());
        let err = rule.execute(SessionId::new(), "  \n").await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyQuestion));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut retriever = MockRetrievalPort::new();
        retriever.expect_search().never();

        let rule = use_case(store, retriever, MockLlmPort::new(), RulingConfig::default());
        let err = rule.execute(SessionId::new(), "Who goes first?").await.unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn upstream_failure_leaves_session_untouched() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools()
            .returning(|_, _| Err(LlmError::RequestFailed("connection refused".into())));

        let rule = use_case(store.clone(), strike_passages(), llm, RulingConfig::default());
        let err = rule.execute(s.id(), "What happens?").await.unwrap_err();

        assert!(matches!(err, EngineError::UpstreamUnavailable(_)));
        assert_eq!(store.get(s.id()).await.unwrap().unwrap(), s);
    }

    #[tokio::test]
    async fn retrieval_failure_is_upstream_unavailable() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut retriever = MockRetrievalPort::new();
        retriever
            .expect_search()
            .returning(|game, _, _| Err(RetrievalError::UnknownGame(game.to_string())));
        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools().never();

        let rule = use_case(store, retriever, llm, RulingConfig::default());
        let err = rule.execute(s.id(), "What happens?").await.unwrap_err();
        assert!(matches!(err, EngineError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn retrieval_uses_configured_top_k() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut retriever = MockRetrievalPort::new();
        retriever
            .expect_search()
            .withf(|game, query, k| game.as_str() == "Dungeon Duel" && query == "Who wins ties?" && *k == 3)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools().returning(|request, _| {
            assert_eq!(request.temperature, None);
            Ok(LlmResponse::text("The rulebook does not cover ties."))
        });

        let config = RulingConfig {
            retrieval_top_k: 3,
            temperature: None,
            ..RulingConfig::default()
        };
        let rule = use_case(store, retriever, llm, config);
        let result = rule.execute(s.id(), "  Who wins ties? ").await.unwrap();

        assert!(result.weak_grounding);
        assert!(result.citations.is_empty());
    }

    #[tokio::test]
    async fn passages_beyond_top_k_are_not_sent_to_the_model() {
        let store = Arc::new(InMemorySessionStore::new());
        let s = stored(&store).await;

        let mut retriever = MockRetrievalPort::new();
        retriever.expect_search().returning(|_, _, _| {
            Ok((1..=6)
                .map(|n| Passage::new(format!("Rule number {n}.")))
                .collect())
        });
        let mut llm = MockLlmPort::new();
        llm.expect_generate_with_tools()
            .times(1)
            .returning(|request, _| {
                let system = request.system_prompt.unwrap_or_default();
                assert!(system.contains("[Passage 2]\nRule number 2."));
                assert!(!system.contains("[Passage 3]"));
                assert!(!system.contains("Rule number 3."));
                Ok(LlmResponse::text("Rule number 2 applies [Passage 2]."))
            });

        let config = RulingConfig {
            retrieval_top_k: 2,
            ..RulingConfig::default()
        };
        let rule = use_case(store, retriever, llm, config);
        let result = rule.execute(s.id(), "Which rule applies?").await.unwrap();

        assert!(!result.weak_grounding);
    }
}
