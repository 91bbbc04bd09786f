//! Application state and composition.

use std::sync::Arc;

use rulewarden_domain::{
    GameSession, ManualAdjustment, PlayerSpec, RulingResult, SessionId, SessionSummary,
    StateChange,
};

use crate::infrastructure::{
    clock::SystemClock,
    memory_store::InMemorySessionStore,
    openai_compat::OpenAiCompatClient,
    ports::{ClockPort, LlmPort, RetrievalPort, SessionStore},
    resilience::{ResilientLlmClient, ResilientRetriever},
    settings::EngineSettings,
};
use crate::stores::SessionLocks;
use crate::use_cases::{self, EngineError, SessionGate};

/// Main application state.
///
/// Holds the ports and every use case. Outer surfaces (HTTP, chat bots, CLI)
/// wrap an `Arc<App>` and call the exposed operations below.
pub struct App {
    pub use_cases: UseCases,
    pub store: Arc<dyn SessionStore>,
    pub settings: EngineSettings,
}

pub struct UseCases {
    pub session: use_cases::SessionUseCases,
    pub ruling: use_cases::RulingUseCases,
}

impl App {
    /// Compose the engine. The retriever and model are wrapped in retrying
    /// clients configured from `settings.retry`.
    pub fn new(
        store: Arc<dyn SessionStore>,
        retriever: Arc<dyn RetrievalPort>,
        llm: Arc<dyn LlmPort>,
        settings: EngineSettings,
    ) -> Self {
        Self::with_clock(store, retriever, llm, Arc::new(SystemClock::new()), settings)
    }

    pub fn with_clock(
        store: Arc<dyn SessionStore>,
        retriever: Arc<dyn RetrievalPort>,
        llm: Arc<dyn LlmPort>,
        clock_port: Arc<dyn ClockPort>,
        settings: EngineSettings,
    ) -> Self {
        let llm_port: Arc<dyn LlmPort> =
            Arc::new(ResilientLlmClient::new(llm, settings.retry.clone()));
        let retrieval_port: Arc<dyn RetrievalPort> =
            Arc::new(ResilientRetriever::new(retriever, settings.retry.clone()));

        let gate = SessionGate::new(Arc::new(SessionLocks::new()), settings.busy_policy);

        let session = use_cases::SessionUseCases::new(
            Arc::new(use_cases::session::CreateSession::new(
                store.clone(),
                clock_port.clone(),
                settings.session_limits,
            )),
            Arc::new(use_cases::session::GetSession::new(store.clone())),
            Arc::new(use_cases::session::ListSessions::new(store.clone())),
            Arc::new(use_cases::session::ResetSession::new(
                store.clone(),
                clock_port.clone(),
                gate.clone(),
            )),
            Arc::new(use_cases::session::DeleteSession::new(
                store.clone(),
                gate.clone(),
            )),
            Arc::new(use_cases::session::AdjustSession::new(
                store.clone(),
                clock_port.clone(),
                gate.clone(),
            )),
        );

        let ruling = use_cases::RulingUseCases::new(Arc::new(
            use_cases::ruling::RuleQuestion::new(
                store.clone(),
                retrieval_port,
                llm_port,
                clock_port,
                gate,
                use_cases::ruling::RulingConfig::from(&settings),
            ),
        ));

        tracing::debug!(
            retrieval_top_k = settings.retrieval_top_k,
            max_history_turns = settings.max_history_turns,
            busy_policy = %settings.busy_policy,
            "Engine composed"
        );

        Self {
            use_cases: UseCases { session, ruling },
            store,
            settings,
        }
    }

    /// In-memory sessions and an OpenAI-compatible model configured from
    /// `settings.llm`.
    pub fn in_memory(retriever: Arc<dyn RetrievalPort>, settings: EngineSettings) -> Self {
        let llm = OpenAiCompatClient::with_timeout(
            &settings.llm.base_url,
            &settings.llm.model,
            settings.llm.api_key.clone(),
            settings.llm.request_timeout_secs,
        );
        tracing::info!(
            model = %llm.model(),
            base_url = %settings.llm.base_url,
            "Using OpenAI-compatible model server"
        );
        Self::new(
            Arc::new(InMemorySessionStore::new()),
            retriever,
            Arc::new(llm),
            settings,
        )
    }

    // =========================================================================
    // Exposed operations
    // =========================================================================

    pub async fn create_session(
        &self,
        game_id: &str,
        players: Vec<PlayerSpec>,
    ) -> Result<SessionId, EngineError> {
        self.use_cases.session.create.execute(game_id, players).await
    }

    pub async fn get_session(&self, id: SessionId) -> Result<GameSession, EngineError> {
        self.use_cases.session.get.execute(id).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, EngineError> {
        self.use_cases.session.list.execute().await
    }

    pub async fn reset_session(&self, id: SessionId) -> Result<(), EngineError> {
        self.use_cases.session.reset.execute(id).await
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<(), EngineError> {
        self.use_cases.session.delete.execute(id).await
    }

    /// Answer a rules question and apply the state changes it calls for.
    pub async fn rule(&self, id: SessionId, question: &str) -> Result<RulingResult, EngineError> {
        self.use_cases.ruling.rule.execute(id, question).await
    }

    pub async fn manual_adjust(
        &self,
        id: SessionId,
        player: &str,
        adjustment: ManualAdjustment,
    ) -> Result<StateChange, EngineError> {
        self.use_cases
            .session
            .adjust
            .manual_adjust(id, player, adjustment)
            .await
    }

    pub async fn advance_round(&self, id: SessionId) -> Result<StateChange, EngineError> {
        self.use_cases.session.adjust.advance_round(id).await
    }

    pub async fn set_global_effect(
        &self,
        id: SessionId,
        effect: &str,
        active: bool,
    ) -> Result<StateChange, EngineError> {
        self.use_cases
            .session
            .adjust
            .set_global_effect(id, effect, active)
            .await
    }
}
