//! Core traits for session storage and the remote collaborators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{RangeId, Session};

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
    #[error("Session store is corrupt: {0}")]
    Corrupt(String),
}

/// Trait for session storage backends.
///
/// A backend only knows how to read and replace the whole record set.
/// Locking and read-modify-write sequencing live one layer up, so that a
/// load and the following save always run inside one critical section.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load every persisted session, in stored order.
    async fn load(&self) -> Result<Vec<Session>, StorageError>;

    /// Atomically replace the persisted sessions.
    async fn save(&self, sessions: &[Session]) -> Result<(), StorageError>;
}

/// Successful collaborator reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorReply {
    /// Free-form message (e.g. range access notification).
    pub message: Option<String>,
    /// Identifier of a published activity.
    pub activity_id: Option<String>,
}

/// Collaborator call error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator answered with an `ERROR` status.
    #[error("Collaborator reported an error: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
    /// The reply could not be understood.
    #[error("Malformed collaborator response: {0}")]
    Parse(String),
    /// The collaborator could not be reached or timed out.
    #[error("Collaborator unreachable: {0}")]
    Transport(String),
}

impl CollaboratorError {
    /// Whether the failure happened before a usable reply arrived.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the collaborator answered with an explicit `ERROR` status.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Content collaborator (learning management system).
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Publish learning content for a range; the reply carries the activity id.
    async fn upload_content(
        &self,
        actor: &str,
        range_id: RangeId,
        descriptor: &str,
    ) -> Result<CollaboratorReply, CollaboratorError>;

    /// Remove a previously published activity.
    async fn remove_content(
        &self,
        actor: &str,
        range_id: RangeId,
        activity_id: &str,
    ) -> Result<CollaboratorReply, CollaboratorError>;
}

/// Range collaborator (cyber range manager).
#[async_trait]
pub trait RangeService: Send + Sync {
    /// Instantiate a range from a materialized descriptor.
    async fn instantiate_range(
        &self,
        actor: &str,
        range_id: RangeId,
        descriptor: &str,
        progression_scenario: Option<&str>,
    ) -> Result<CollaboratorReply, CollaboratorError>;

    /// Tear down a range.
    async fn destroy_range(
        &self,
        actor: &str,
        range_id: RangeId,
    ) -> Result<CollaboratorReply, CollaboratorError>;
}
