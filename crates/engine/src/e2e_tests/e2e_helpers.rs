//! Scripted fakes and App construction for end-to-end tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use rulewarden_domain::{GameId, PlayerSpec, SessionId};

use crate::app::App;
use crate::infrastructure::memory_store::InMemorySessionStore;
use crate::infrastructure::ports::{
    LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole, Passage, RetrievalError,
    RetrievalPort, ToolDefinition,
};
use crate::infrastructure::resilience::RetryConfig;
use crate::infrastructure::settings::EngineSettings;
use crate::stores::BusyPolicy;

// =============================================================================
// Scripted model
// =============================================================================

/// Answers each question with a canned response keyed by the question text.
///
/// Unscripted questions get a plain "no ruling" answer with no tool calls.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<HashMap<String, LlmResponse>>,
    delay: Option<Duration>,
    asked: Mutex<Vec<String>>,
    message_counts: Mutex<Vec<usize>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, question: &str, response: LlmResponse) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.insert(question.to_string(), response);
        }
        self
    }

    /// Sleep before every answer.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Questions seen so far, in call order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Chat messages per request, in call order.
    pub fn message_counts(&self) -> Vec<usize> {
        self.message_counts.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate_with_tools(
        &self,
        request: LlmRequest,
        _tools: Vec<ToolDefinition>,
    ) -> Result<LlmResponse, LlmError> {
        let question = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.clone());
        }
        if let Ok(mut counts) = self.message_counts.lock() {
            counts.push(request.messages.len());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .script
            .lock()
            .ok()
            .and_then(|script| script.get(&question).cloned());
        Ok(scripted.unwrap_or_else(|| LlmResponse::text("No relevant rule found in the rulebook.")))
    }
}

// =============================================================================
// Static retrieval store
// =============================================================================

/// Same passages for every query of a known game; nothing for other games.
pub struct StaticRetriever {
    game: String,
    passages: Vec<Passage>,
}

impl StaticRetriever {
    pub fn new(game: &str, passages: Vec<Passage>) -> Self {
        Self {
            game: game.to_string(),
            passages,
        }
    }

    pub fn empty() -> Self {
        Self::new("", Vec::new())
    }
}

#[async_trait]
impl RetrievalPort for StaticRetriever {
    async fn search(
        &self,
        game_id: &GameId,
        _query: &str,
        k: usize,
    ) -> Result<Vec<Passage>, RetrievalError> {
        if game_id.as_str() != self.game {
            return Ok(Vec::new());
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

// =============================================================================
// App construction
// =============================================================================

pub const GAME: &str = "Dungeon Duel";

/// Settings for tests: no retry backoff, default everything else.
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        retry: RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        },
        ..EngineSettings::default()
    }
}

pub fn rulebook() -> StaticRetriever {
    StaticRetriever::new(
        GAME,
        vec![
            Passage::new("A Strike card deals 5 damage to the target.")
                .at("Cards, p. 4")
                .scored(0.92),
            Passage::new("A Jab card deals 3 damage to the target.")
                .at("Cards, p. 4")
                .scored(0.88),
            Passage::new("Health never drops below 0.").at("Core rules, p. 2"),
        ],
    )
}

/// Route engine logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rulewarden_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub fn build_app(llm: ScriptedLlm, retriever: StaticRetriever, settings: EngineSettings) -> App {
    init_test_logging();
    App::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(retriever),
        Arc::new(llm),
        settings,
    )
}

/// Alice (20 hp, 3 gold) and Bob (20 hp).
pub async fn two_player_session(app: &App) -> SessionId {
    app.create_session(
        GAME,
        vec![
            PlayerSpec::new("Alice", 20).with_resource("gold", 3),
            PlayerSpec::new("Bob", 20),
        ],
    )
    .await
    .unwrap()
}

pub fn busy_settings() -> EngineSettings {
    EngineSettings {
        busy_policy: BusyPolicy::Reject,
        ..test_settings()
    }
}
