//! Request gatekeeping and action dispatch.

use cyrange_core::{
    ContentService, Language, RangeService, Session, TrainingCatalog, UserDirectory, UserProfile,
};
use cyrange_session::{CreateTrainingRequest, TrainingError, TrainingManager};
use serde_json::Value;
use thiserror::Error;

use crate::{
    auth::PasswordVerifier,
    protocol::{ClientAction, ClientRequest, ServerResponse},
};

/// Rejection of a client request. The `Display` text is sent to the client.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    #[error("Server could not load the user information database")]
    UserSettingsLoading,
    #[error("User id is missing")]
    UserIdMissing,
    #[error("User id is invalid")]
    UserIdInvalid,
    #[error("User password not in database")]
    PasswordNotInDatabase,
    #[error("User password is missing")]
    PasswordMissing,
    #[error("User id and/or password are invalid")]
    CredentialsInvalid,
    #[error("Action is missing")]
    ActionMissing,
    #[error("Action is invalid")]
    ActionInvalid,
    #[error("Language is missing")]
    LanguageMissing,
    #[error("Language is invalid")]
    LanguageInvalid,
    #[error("Malformed request")]
    MalformedRequest,
    #[error(transparent)]
    Training(#[from] TrainingError),
}

/// Client-facing coordinator: authenticates requests and runs actions.
pub struct Coordinator<C, R, V>
where
    C: ContentService,
    R: RangeService,
    V: PasswordVerifier,
{
    manager: TrainingManager<C, R>,
    verifier: V,
}

impl<C, R, V> Coordinator<C, R, V>
where
    C: ContentService,
    R: RangeService,
    V: PasswordVerifier,
{
    /// Create a new coordinator.
    #[must_use]
    pub const fn new(manager: TrainingManager<C, R>, verifier: V) -> Self {
        Self { manager, verifier }
    }

    /// Training manager.
    #[must_use]
    pub const fn manager(&self) -> &TrainingManager<C, R> {
        &self.manager
    }

    /// Handle one client request. Failures become `ERROR` replies.
    pub async fn handle(&self, request: &ClientRequest) -> ServerResponse {
        tracing::debug!(?request, "Client request");
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    user = request.user.as_deref().unwrap_or("-"),
                    action = request.action.as_deref().unwrap_or("-"),
                    "Request rejected: {e}"
                );
                ServerResponse::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: &ClientRequest) -> Result<ServerResponse, GatekeeperError> {
        let config = self.manager.config();
        let users = UserDirectory::load(config.users_path()).await.map_err(|e| {
            tracing::error!("Cannot load users database: {e}");
            GatekeeperError::UserSettingsLoading
        })?;

        let user_id = field(request.user.as_deref()).ok_or(GatekeeperError::UserIdMissing)?;
        let user = users.find(user_id).ok_or(GatekeeperError::UserIdInvalid)?;

        if config.require_password {
            self.authenticate(user, request.password.as_deref()).await?;
        }

        let action: ClientAction = field(request.action.as_deref())
            .ok_or(GatekeeperError::ActionMissing)?
            .parse()
            .map_err(|_| GatekeeperError::ActionInvalid)?;

        let language: Language = field(request.lang.as_deref())
            .ok_or(GatekeeperError::LanguageMissing)?
            .parse()
            .map_err(|_| GatekeeperError::LanguageInvalid)?;

        let catalog = self.manager.load_catalog(language).await?;

        tracing::info!(user = %user.id, %action, %language, "Dispatching request");
        self.run(action, user, &catalog, language, request).await
    }

    async fn authenticate(
        &self,
        user: &UserProfile,
        supplied: Option<&str>,
    ) -> Result<(), GatekeeperError> {
        let stored = user
            .password
            .as_deref()
            .ok_or(GatekeeperError::PasswordNotInDatabase)?;
        let supplied = supplied
            .filter(|p| !p.is_empty())
            .ok_or(GatekeeperError::PasswordMissing)?;

        match self.verifier.verify(user, stored, supplied).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(GatekeeperError::CredentialsInvalid),
            Err(e) => {
                tracing::error!(user = %user.id, "Password verification failed: {e}");
                Err(GatekeeperError::CredentialsInvalid)
            }
        }
    }

    async fn run(
        &self,
        action: ClientAction,
        user: &UserProfile,
        catalog: &TrainingCatalog,
        language: Language,
        request: &ClientRequest,
    ) -> Result<ServerResponse, GatekeeperError> {
        match action {
            ClientAction::FetchContent => Ok(ServerResponse::success()
                .with_field("types", to_value(&catalog.types))
                .with_object("scenarios", to_value(&catalog.scenario_summaries()))),
            ClientAction::CreateTraining => {
                let create = CreateTrainingRequest {
                    language,
                    instance_count: request.count.clone(),
                    training_type: request.training_type.clone(),
                    scenario: request.scenario.clone(),
                    level: request.level.clone(),
                };
                let created = self.manager.create_training(user, catalog, &create).await?;
                Ok(ServerResponse::success().with_message(created.message))
            }
            ClientAction::GetConfigurations => {
                let saved = self.manager.configurations(&user.id).await?;
                Ok(sessions_response(&saved))
            }
            ClientAction::GetSessions => {
                let active = self.manager.sessions(&user.id).await?;
                Ok(sessions_response(&active))
            }
            ClientAction::EndTraining => {
                self.manager
                    .end_training(&user.id, request.range_id.as_deref())
                    .await?;
                Ok(ServerResponse::success())
            }
        }
    }
}

fn field(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn sessions_response(sessions: &[Session]) -> ServerResponse {
    ServerResponse::success().with_field("sessions", to_value(&sessions))
}
