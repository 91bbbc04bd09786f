//! Session store port.
//!
//! One record per session holding players, turn state, and transcript, so a
//! single `put` commits a ruling's state changes and its transcript turn
//! together.

use async_trait::async_trait;
use rulewarden_domain::{GameSession, SessionId};

use super::error::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: SessionId) -> Result<Option<GameSession>, StoreError>;

    /// Store a brand-new session. Fails with `AlreadyExists` on id collision.
    async fn insert(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Compare-and-swap write: succeeds only if the stored record still has
    /// `expected_version`. The caller has already bumped `session.version()`.
    async fn put(&self, session: &GameSession, expected_version: u64) -> Result<(), StoreError>;

    /// Returns false if nothing was stored under `id`.
    async fn delete(&self, id: SessionId) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<GameSession>, StoreError>;
}
