//! In-memory session store.

use tokio::sync::Mutex;

use crate::error::StorageError;

use super::{Session, SessionStore};

/// Keeps the session for the life of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
    saves: Mutex<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session, e.g. one obtained by another process.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            saves: Mutex::new(0),
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Number of times a refreshed session has been saved.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        *self.session.lock().await = Some(session.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }
}
