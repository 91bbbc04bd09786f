//! Error type surfaced by every exposed engine operation.

use rulewarden_domain::{DomainError, SessionId};

use crate::infrastructure::ports::{LlmError, RetrievalError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Another ruling holds the session and the busy policy is `Reject`.
    #[error("Session {0} is busy with another ruling")]
    SessionBusy(SessionId),

    #[error("Duplicate player name: {0}")]
    DuplicatePlayerName(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Question is empty")]
    EmptyQuestion,

    /// Retrieval or model failed after retries, or the ruling deadline passed.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The session changed underneath a write twice in a row.
    #[error("Persistence conflict on session {0}")]
    PersistenceConflict(SessionId),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl EngineError {
    /// Map a store failure on `id` to the caller-facing error.
    pub fn store(id: SessionId, error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::SessionNotFound(id),
            StoreError::Conflict { .. } => Self::PersistenceConflict(id),
            other => Self::Storage(other),
        }
    }

    /// True for failures where an identical retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SessionBusy(_) | Self::UpstreamUnavailable(_) | Self::PersistenceConflict(_)
        )
    }
}

impl From<DomainError> for EngineError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::DuplicatePlayerName(name) => Self::DuplicatePlayerName(name),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::InvalidSession(msg),
        }
    }
}

impl From<LlmError> for EngineError {
    fn from(error: LlmError) -> Self {
        Self::UpstreamUnavailable(error.to_string())
    }
}

impl From<RetrievalError> for EngineError {
    fn from(error: RetrievalError) -> Self {
        Self::UpstreamUnavailable(error.to_string())
    }
}
