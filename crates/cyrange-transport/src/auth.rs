//! Password verification for client requests.

use async_trait::async_trait;
use cyrange_core::UserProfile;
use thiserror::Error;

/// Verifier error.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Password verifier unavailable: {0}")]
    Unavailable(String),
}

/// Trait for checking a supplied password against a user's stored one.
///
/// Implement this trait to plug in the password scheme of your user
/// database. The coordinator only asks for a yes/no answer.
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    /// Check `supplied` against the password stored for `user`.
    ///
    /// # Arguments
    /// * `user` - Profile as loaded from the users database
    /// * `stored` - Stored password (or hash) for the user
    /// * `supplied` - Password sent with the request
    async fn verify(
        &self,
        user: &UserProfile,
        stored: &str,
        supplied: &str,
    ) -> Result<bool, VerifierError>;
}

/// Development verifier that accepts every password.
#[derive(Debug, Default, Clone)]
pub struct AcceptAnyPassword;

#[async_trait]
impl PasswordVerifier for AcceptAnyPassword {
    async fn verify(
        &self,
        _user: &UserProfile,
        _stored: &str,
        _supplied: &str,
    ) -> Result<bool, VerifierError> {
        Ok(true)
    }
}
