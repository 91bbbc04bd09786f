//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the session store:
//! - `SessionLocks` - one async mutex per session serializing rulings

pub mod session_locks;

pub use session_locks::{BusyPolicy, SessionGuard, SessionLocks};
