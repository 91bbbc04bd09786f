//! Unified error types for the domain layer
//!
//! Session construction and value-object validation report through
//! `DomainError`. Tool invocations never produce a `DomainError`: an invalid
//! invocation becomes a rejected `StateChange` instead.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Two players in one session share a name
    #[error("Duplicate player name: {0}")]
    DuplicatePlayerName(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// Use this when domain invariants or constraints are violated:
    /// - Required fields are empty or missing
    /// - Values are outside allowed ranges
    ///
    /// # Example
    /// ```ignore
    /// if max_hp <= 0 {
    ///     return Err(DomainError::validation("max_hp must be positive"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a duplicate player name error
    pub fn duplicate_player(name: impl Into<String>) -> Self {
        Self::DuplicatePlayerName(name.into())
    }
}
