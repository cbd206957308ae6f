use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::entities::SessionRecord;
use crate::error::Error;
use crate::ports::{GameSessionService, SessionStore};

/// Keeps a stored game session alive or shuts it down.
///
/// Refresh and terminate are best-effort: on failure the stored record is left
/// exactly as it was and the caller decides whether to retry or drop it.
pub struct GameSessionUseCase<S, St>
where
    S: GameSessionService,
    St: SessionStore,
{
    sessions: Arc<S>,
    store: Arc<St>,
}

impl<S, St> GameSessionUseCase<S, St>
where
    S: GameSessionService,
    St: SessionStore,
{
    pub fn new(sessions: Arc<S>, store: Arc<St>) -> Self {
        Self { sessions, store }
    }

    /// Persist a freshly opened session
    pub async fn remember(&self, record: &SessionRecord) -> Result<(), Error> {
        self.store.save(record).await
    }

    pub async fn current(&self) -> Result<SessionRecord, Error> {
        self.store.load().await?.ok_or(Error::NoStoredSession)
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SessionRecord, Error> {
        let record = self.current().await?;
        if let Err(e) = self.sessions.refresh(&record.session).await {
            warn!(error = %e, "session refresh failed");
            return Err(e);
        }
        info!(owner = %record.owner, "session refreshed");
        Ok(record)
    }

    /// Terminate the stored session and forget it once the server agrees
    #[instrument(skip(self))]
    pub async fn terminate(&self) -> Result<SessionRecord, Error> {
        let record = self.current().await?;
        if let Err(e) = self.sessions.terminate(&record.session).await {
            warn!(error = %e, "session termination failed");
            return Err(e);
        }
        self.store.clear().await?;
        info!(owner = %record.owner, "session terminated");
        Ok(record)
    }
}
