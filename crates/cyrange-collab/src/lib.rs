//! Collaborator protocol and HTTP client.
//!
//! Provides:
//! - Collaborator wire protocol (form request + status-array reply)
//! - `HttpCollaborator` implementing the content and range traits

pub mod client;
pub mod protocol;

pub use client::HttpCollaborator;
pub use protocol::{CollaboratorAction, CollaboratorRequest, parse_reply};
