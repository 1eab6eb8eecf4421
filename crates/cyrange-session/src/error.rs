//! Training workflow errors.
//!
//! The `Display` text of each variant is the message returned to clients.

use cyrange_core::{CollaboratorError, catalog::CatalogError};
use thiserror::Error;

use crate::store::StoreError;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing request field; nothing was touched.
    Validation,
    /// Every range id is in use.
    AllocationExhausted,
    /// Unknown scenario, level or descriptor.
    Lookup,
    /// Local database or session store unreadable.
    Storage,
    /// A collaborator answered with an `ERROR` status.
    Collaborator,
    /// A collaborator could not be reached or sent an unreadable reply.
    Transport,
    /// Stored state contradicts an invariant.
    Consistency,
}

/// Training workflow error.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Instance count is missing")]
    InstanceCountMissing,
    #[error("Instance count is invalid")]
    InstanceCountInvalid,
    #[error("Training type is invalid or missing")]
    TrainingTypeMissing,
    #[error("Scenario name is missing")]
    ScenarioNameMissing,
    #[error("Level name is missing")]
    LevelNameMissing,
    #[error("Session id is missing")]
    SessionIdMissing,
    #[error("Session id is invalid: {0}")]
    SessionIdInvalid(String),

    #[error("Server could not allocate a new session (maximum number reached)")]
    SessionAllocation,

    #[error("Server could not determine the training content for the specified scenario and level")]
    ContentIdentification,
    #[error("Server could not determine the cyber range template for the specified scenario and level")]
    TemplateIdentification,

    #[error("Server could not load the training settings database")]
    TrainingSettingsLoading(#[source] CatalogError),
    #[error("Server could not load the training content")]
    ContentLoading(#[source] std::io::Error),
    #[error("Server could not load the cyber range template")]
    TemplateLoading(#[source] std::io::Error),
    #[error("Server could not access the session database")]
    SessionStore(#[source] StoreError),

    #[error("LMS content manager could not upload the training content")]
    ContentUpload(#[source] CollaboratorError),
    #[error("Server could not communicate with the LMS content manager")]
    ContentServer(#[source] CollaboratorError),
    #[error("LMS content manager could not remove the training activity")]
    ContentRemoval(#[source] CollaboratorError),
    #[error("Cyber range manager could not instantiate the cyber range")]
    Instantiation(#[source] CollaboratorError),
    #[error("Server could not communicate with the cyber range manager")]
    InstantiationServer(#[source] CollaboratorError),
    #[error("Cyber range manager could not destroy the cyber range")]
    Destruction(#[source] CollaboratorError),

    #[error("Server encountered a session information consistency issue")]
    SessionInfoConsistency,
}

impl TrainingError {
    /// Category of the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InstanceCountMissing
            | Self::InstanceCountInvalid
            | Self::TrainingTypeMissing
            | Self::ScenarioNameMissing
            | Self::LevelNameMissing
            | Self::SessionIdMissing
            | Self::SessionIdInvalid(_) => ErrorKind::Validation,
            Self::SessionAllocation => ErrorKind::AllocationExhausted,
            Self::ContentIdentification | Self::TemplateIdentification => ErrorKind::Lookup,
            Self::TrainingSettingsLoading(_)
            | Self::ContentLoading(_)
            | Self::TemplateLoading(_)
            | Self::SessionStore(_) => ErrorKind::Storage,
            Self::ContentServer(_) | Self::InstantiationServer(_) => ErrorKind::Transport,
            Self::ContentUpload(e)
            | Self::ContentRemoval(e)
            | Self::Instantiation(e)
            | Self::Destruction(e) => {
                if e.is_rejected() {
                    ErrorKind::Collaborator
                } else {
                    ErrorKind::Transport
                }
            }
            Self::SessionInfoConsistency => ErrorKind::Consistency,
        }
    }
}

impl From<StoreError> for TrainingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Allocation(_) => Self::SessionAllocation,
            StoreError::Duplicate(_) => Self::SessionInfoConsistency,
            StoreError::Storage(_) => Self::SessionStore(e),
        }
    }
}
