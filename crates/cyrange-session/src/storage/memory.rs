//! In-memory session storage.

use std::sync::RwLock;

use async_trait::async_trait;
use cyrange_core::{Session, SessionStorage, StorageError};

/// In-memory storage implementation.
///
/// Useful for tests and single-process development setups.
/// Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: RwLock<Vec<Session>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with sessions.
    #[must_use]
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: RwLock::new(sessions),
        }
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> Result<Vec<Session>, StorageError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
            .clone())
    }

    async fn save(&self, sessions: &[Session]) -> Result<(), StorageError> {
        *self
            .sessions
            .write()
            .map_err(|e| StorageError::Unavailable(e.to_string()))? = sessions.to_vec();
        Ok(())
    }
}
