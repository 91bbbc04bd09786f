//! Per-session mutual exclusion.
//!
//! Each session id maps to its own `tokio::sync::Mutex`, so rulings on
//! different sessions never contend while two calls on the same session run
//! their load -> mutate -> persist section one after the other. Tokio's mutex
//! grants the lock in request order, which gives FIFO queueing.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use rulewarden_domain::SessionId;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What to do when a session already has a ruling in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Wait for the in-flight call to finish.
    #[default]
    Queue,
    /// Fail immediately with `SessionBusy`.
    Reject,
}

impl fmt::Display for BusyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue => write!(f, "queue"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for BusyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" | "wait" => Ok(Self::Queue),
            "reject" | "fail" => Ok(Self::Reject),
            other => Err(format!("unknown busy policy '{other}'")),
        }
    }
}

/// Held for the duration of a session's critical section. Dropping it, on any
/// exit path, lets the next waiter in.
pub struct SessionGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: SessionId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Enter the session's critical section. Returns `None` only under
    /// `BusyPolicy::Reject` when another call holds the lock.
    pub async fn acquire(&self, id: SessionId, policy: BusyPolicy) -> Option<SessionGuard> {
        let lock = self.lock_for(id);
        match policy {
            BusyPolicy::Queue => Some(SessionGuard {
                _guard: lock.lock_owned().await,
            }),
            BusyPolicy::Reject => lock
                .try_lock_owned()
                .ok()
                .map(|guard| SessionGuard { _guard: guard }),
        }
    }

    /// Forget a deleted session's lock. Callers already waiting on it keep
    /// their handle and will find the session gone.
    pub fn remove(&self, id: SessionId) {
        self.locks.remove(&id);
    }

    /// Drop the entry for `id` unless a guard or a waiter still holds it.
    /// Used after a lookup finds no session, so unknown ids leave nothing
    /// behind.
    pub fn remove_if_idle(&self, id: SessionId) -> bool {
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
