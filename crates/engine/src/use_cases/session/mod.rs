//! Session use cases.
//!
//! Lifecycle (create, read, list, reset, delete) and manual corrections.

use std::sync::Arc;

mod adjust;
mod create;
mod manage;

pub use adjust::AdjustSession;
pub use create::CreateSession;
pub use manage::{DeleteSession, GetSession, ListSessions, ResetSession};

/// Container for session use cases.
pub struct SessionUseCases {
    pub create: Arc<CreateSession>,
    pub get: Arc<GetSession>,
    pub list: Arc<ListSessions>,
    pub reset: Arc<ResetSession>,
    pub delete: Arc<DeleteSession>,
    pub adjust: Arc<AdjustSession>,
}

impl SessionUseCases {
    pub fn new(
        create: Arc<CreateSession>,
        get: Arc<GetSession>,
        list: Arc<ListSessions>,
        reset: Arc<ResetSession>,
        delete: Arc<DeleteSession>,
        adjust: Arc<AdjustSession>,
    ) -> Self {
        Self {
            create,
            get,
            list,
            reset,
            delete,
            adjust,
        }
    }
}
