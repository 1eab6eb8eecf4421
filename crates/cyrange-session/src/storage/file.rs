//! JSON document session storage.
//!
//! The whole record set lives in one human-readable document and is
//! re-serialized on every save. Saves go through a temporary file and an
//! atomic rename, so readers never observe a half-written document.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use cyrange_core::{Session, SessionStorage, StorageError};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

/// Persisted document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    sessions: Vec<Session>,
}

/// File-backed storage implementation.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, e: &std::io::Error) -> StorageError {
        StorageError::Unavailable(format!("{}: {e}", self.path.display()))
    }
}

#[async_trait]
impl SessionStorage for JsonFileStorage {
    async fn load(&self) -> Result<Vec<Session>, StorageError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.unavailable(&e)),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: SessionDocument = serde_json::from_str(&text).map_err(|e| {
            StorageError::Corrupt(format!("{}: {e}", self.path.display()))
        })?;
        Ok(document.sessions)
    }

    async fn save(&self, sessions: &[Session]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.unavailable(&e))?;
            }
        }

        let document = SessionDocument {
            sessions: sessions.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let tmp_path = self.temp_path();
        let mut tmp = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.unavailable(&e))?;
        tmp.write_all(json.as_bytes())
            .await
            .map_err(|e| self.unavailable(&e))?;
        tmp.sync_all().await.map_err(|e| self.unavailable(&e))?;
        drop(tmp);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.unavailable(&e))?;

        tracing::debug!(path = %self.path.display(), count = sessions.len(), "Saved sessions");
        Ok(())
    }
}
