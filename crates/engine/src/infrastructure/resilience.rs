//! Bounded retry with exponential backoff around upstream ports
//!
//! Every upstream call result is classified into an [`Attempt`]; the retry
//! loop in [`RetryPolicy::run`] is a plain loop over that enum. The LLM and
//! retrieval wrappers below only supply the classification.

use async_trait::async_trait;
use rand::Rng;
use rulewarden_domain::GameId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{
    LlmError, LlmPort, LlmRequest, LlmResponse, Passage, RetrievalError, RetrievalPort,
    ToolDefinition,
};

/// Classified outcome of one upstream call.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Success(T),
    /// Transient failure; worth another try.
    Retryable(E),
    /// Permanent failure; surface immediately.
    Fatal(E),
}

impl<T, E> Attempt<T, E> {
    pub fn classify(result: Result<T, E>, is_retryable: impl Fn(&E) -> bool) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) if is_retryable(&e) => Self::Retryable(e),
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt)
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            jitter_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Calculate delay for a given attempt number using exponential backoff with jitter
    pub fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        // Exponential: base * 2^(attempt-1)
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        // Add jitter: ±jitter_factor around the delay
        let jitter_range = (capped as f64 * self.config.jitter_factor.clamp(0.0, 1.0)) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        }
    }

    /// Run `operation` until it succeeds, fails fatally, or retries run out.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Attempt::Success(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            attempt = attempt + 1,
                            operation = operation_name,
                            "Upstream request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Attempt::Fatal(e) => {
                    tracing::error!(
                        error = %e,
                        operation = operation_name,
                        "Upstream request failed with non-retryable error"
                    );
                    return Err(e);
                }
                Attempt::Retryable(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.calculate_delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay,
                        error = %e,
                        operation = operation_name,
                        "Upstream request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Attempt::Retryable(e) => {
                    tracing::error!(
                        attempts = attempt + 1,
                        error = %e,
                        operation = operation_name,
                        "Upstream request failed after all retry attempts"
                    );
                    return Err(e);
                }
            }
        }
    }
}

// =============================================================================
// LLM
// =============================================================================

/// Wrapper that adds retry logic to any LLM client
pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    policy: RetryPolicy,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self {
            inner,
            policy: RetryPolicy::new(config),
        }
    }

    fn is_retryable(error: &LlmError) -> bool {
        match error {
            // Network/request failures are typically transient
            LlmError::RequestFailed(_) => true,
            // Rate limits, timeouts, and server errors; auth and bad requests are not
            LlmError::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            // Truncated bodies show up as malformed JSON
            LlmError::InvalidResponse(_) => true,
        }
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate_with_tools(
        &self,
        request: LlmRequest,
        tools: Vec<ToolDefinition>,
    ) -> Result<LlmResponse, LlmError> {
        self.policy
            .run("generate_with_tools", || {
                let inner = Arc::clone(&self.inner);
                let request = request.clone();
                let tools = tools.clone();
                async move {
                    Attempt::classify(
                        inner.generate_with_tools(request, tools).await,
                        Self::is_retryable,
                    )
                }
            })
            .await
    }
}

// =============================================================================
// Retrieval
// =============================================================================

/// Wrapper that adds retry logic to any retrieval backend
pub struct ResilientRetriever {
    inner: Arc<dyn RetrievalPort>,
    policy: RetryPolicy,
}

impl ResilientRetriever {
    pub fn new(inner: Arc<dyn RetrievalPort>, config: RetryConfig) -> Self {
        Self {
            inner,
            policy: RetryPolicy::new(config),
        }
    }

    fn is_retryable(error: &RetrievalError) -> bool {
        matches!(error, RetrievalError::RequestFailed(_))
    }
}

#[async_trait]
impl RetrievalPort for ResilientRetriever {
    async fn search(
        &self,
        game_id: &GameId,
        query: &str,
        k: usize,
    ) -> Result<Vec<Passage>, RetrievalError> {
        let inner = &self.inner;
        self.policy
            .run("search", move || async move {
                Attempt::classify(inner.search(game_id, query, k).await, Self::is_retryable)
            })
            .await
    }
}
