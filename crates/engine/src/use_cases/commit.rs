//! Compare-and-swap persistence shared by every mutating use case.
//!
//! `stage` turns a base snapshot into the next one. If the write loses a
//! version race, the session is reloaded and `stage` runs once more against
//! the fresh snapshot; a second conflict is surfaced.

use chrono::{DateTime, Utc};
use rulewarden_domain::GameSession;

use super::error::EngineError;
use crate::infrastructure::ports::{ClockPort, SessionStore};

pub(crate) async fn commit<T, F>(
    store: &dyn SessionStore,
    clock: &dyn ClockPort,
    snapshot: GameSession,
    mut stage: F,
) -> Result<T, EngineError>
where
    F: FnMut(&GameSession, DateTime<Utc>) -> (GameSession, T),
{
    let id = snapshot.id();
    let mut base = snapshot;
    let mut reloaded = false;

    loop {
        let now = clock.now();
        let (mut next, output) = stage(&base, now);
        if next == base {
            // Nothing changed (every invocation rejected); skip the write.
            return Ok(output);
        }

        let expected = base.version();
        next.bump_version(now);
        match store.put(&next, expected).await {
            Ok(()) => return Ok(output),
            Err(e) if e.is_conflict() && !reloaded => {
                tracing::warn!(
                    session_id = %id,
                    error = %e,
                    "Session changed during write, reapplying against fresh snapshot"
                );
                reloaded = true;
                base = store
                    .get(id)
                    .await
                    .map_err(|e| EngineError::store(id, e))?
                    .ok_or(EngineError::SessionNotFound(id))?;
            }
            Err(e) => {
                if e.is_conflict() {
                    tracing::warn!(session_id = %id, error = %e, "Second write conflict, giving up");
                }
                return Err(EngineError::store(id, e));
            }
        }
    }
}
