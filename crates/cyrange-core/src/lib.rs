//! Core abstractions for cyber range training sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `RangeId` / `Session` - Session record model
//! - `allocate` - Range id allocation policy
//! - `template::render` - Descriptor token substitution
//! - `TrainingCatalog` / `UserDirectory` - Local databases
//! - Storage and collaborator traits

pub mod allocator;
pub mod catalog;
pub mod config;
pub mod context;
pub mod session;
pub mod template;
pub mod traits;
pub mod users;

pub use allocator::{AllocationError, allocate};
pub use catalog::TrainingCatalog;
pub use config::{CoordinatorConfig, Language};
pub use context::TemplateContext;
pub use session::{RangeId, Session};
pub use traits::{
    CollaboratorError, CollaboratorReply, ContentService, RangeService, SessionStorage,
    StorageError,
};
pub use users::{UserDirectory, UserProfile};
