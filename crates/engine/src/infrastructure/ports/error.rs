//! Error types for port operations.

/// Session store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Compare-and-swap write lost to another writer.
    #[error("Version conflict for session {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Insert of an id that already exists.
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// Backend operation failed - includes operation name for tracing.
    #[error("Store error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound(id.to_string())
    }

    pub fn backend(operation: &'static str, message: impl ToString) -> Self {
        Self::Backend {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    /// Non-success HTTP status from the model server.
    #[error("LLM server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("Retrieval request failed: {0}")]
    RequestFailed(String),
    #[error("Unknown game: {0}")]
    UnknownGame(String),
}
