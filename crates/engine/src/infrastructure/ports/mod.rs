//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Session storage (could swap in-memory -> Redis/Postgres)
//! - LLM calls (any OpenAI-compatible server, or a scripted fake)
//! - Rule retrieval (vector store behind a search call)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Storage Ports
// =============================================================================
pub use repos::SessionStore;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, LlmPort, LlmRequest, LlmResponse, MessageRole, Passage,
    RetrievalPort, TokenUsage, ToolCall, ToolDefinition,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockLlmPort, MockRetrievalPort};
#[cfg(test)]
pub use repos::MockSessionStore;
#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LlmError, RetrievalError, StoreError};
