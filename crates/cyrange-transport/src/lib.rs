//! Client-facing transport for the cyber range coordinator.
//!
//! Provides:
//! - Wire protocol (form request, status-array reply)
//! - Request gatekeeping and action dispatch
//! - HTTP router (feature: http)

pub mod auth;
pub mod coordinator;
pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;

pub use auth::{AcceptAnyPassword, PasswordVerifier, VerifierError};
pub use coordinator::{Coordinator, GatekeeperError};
pub use protocol::{ClientAction, ClientRequest, ServerResponse};
