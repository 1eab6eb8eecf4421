//! HTTP client for the content and range collaborators.

use std::time::Duration;

use async_trait::async_trait;
use cyrange_core::{
    CollaboratorError, CollaboratorReply, ContentService, RangeId, RangeService,
};
use reqwest::Client;

use crate::protocol::{CollaboratorRequest, parse_reply};

/// Collaborator endpoint reached over HTTP.
///
/// One instance per collaborator; the same type serves both the content
/// and the range side.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: Client,
    endpoint: String,
}

impl HttpCollaborator {
    /// Create a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create a client reusing an existing connection pool.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one request and wait for the reply.
    ///
    /// # Errors
    /// Returns [`CollaboratorError::Transport`] if the endpoint is unreachable,
    /// times out or answers with a non-success HTTP status; otherwise the
    /// outcome of [`parse_reply`].
    pub async fn call(
        &self,
        request: &CollaboratorRequest,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            action = ?request.action,
            range_id = %request.range_id,
            "Sending collaborator request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .form(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Transport(format!(
                "{} answered HTTP {status}",
                self.endpoint
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        tracing::debug!(endpoint = %self.endpoint, body = %body, "Collaborator response");

        parse_reply(&body)
    }
}

#[async_trait]
impl ContentService for HttpCollaborator {
    async fn upload_content(
        &self,
        actor: &str,
        range_id: RangeId,
        descriptor: &str,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        self.call(&CollaboratorRequest::upload_content(actor, range_id, descriptor))
            .await
    }

    async fn remove_content(
        &self,
        actor: &str,
        range_id: RangeId,
        activity_id: &str,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        self.call(&CollaboratorRequest::remove_content(actor, range_id, activity_id))
            .await
    }
}

#[async_trait]
impl RangeService for HttpCollaborator {
    async fn instantiate_range(
        &self,
        actor: &str,
        range_id: RangeId,
        descriptor: &str,
        progression_scenario: Option<&str>,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        self.call(&CollaboratorRequest::instantiate_range(
            actor,
            range_id,
            descriptor,
            progression_scenario,
        ))
        .await
    }

    async fn destroy_range(
        &self,
        actor: &str,
        range_id: RangeId,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        self.call(&CollaboratorRequest::destroy_range(actor, range_id))
            .await
    }
}
