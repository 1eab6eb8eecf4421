//! Training manager: the create/end training workflows.
//!
//! `create_training` runs `Requested -> Allocated -> ContentPublished ->
//! RangeInstantiated -> Committed`. Only id reservation and the final commit
//! take the store lock; collaborator calls run outside it, so several
//! workflows can have calls in flight at once. Any failure after
//! reservation drops the reservation before the error is returned.
//!
//! There is no joint transaction across the two collaborators. Content
//! published before a failed instantiation stays published unless
//! orphan compensation is enabled, and a crash between publishing and
//! committing leaves remote content without a local record.

use chrono::Utc;
use cyrange_core::{
    CollaboratorError, ContentService, CoordinatorConfig, Language, RangeId, RangeService,
    Session, TrainingCatalog, UserProfile, template,
};

use crate::{error::TrainingError, store::SessionStore};

/// Parameters of a create-training request, as received.
#[derive(Debug, Clone, Default)]
pub struct CreateTrainingRequest {
    pub language: Language,
    pub instance_count: Option<String>,
    pub training_type: Option<String>,
    pub scenario: Option<String>,
    pub level: Option<String>,
}

/// A create-training request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidatedRequest {
    language: Language,
    instance_count: u32,
    training_type: String,
    scenario: String,
    level: String,
}

impl CreateTrainingRequest {
    fn validate(&self) -> Result<ValidatedRequest, TrainingError> {
        let count = present(self.instance_count.as_deref())
            .ok_or(TrainingError::InstanceCountMissing)?;
        let instance_count = count
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(TrainingError::InstanceCountInvalid)?;
        let training_type =
            present(self.training_type.as_deref()).ok_or(TrainingError::TrainingTypeMissing)?;
        let scenario =
            present(self.scenario.as_deref()).ok_or(TrainingError::ScenarioNameMissing)?;
        let level = present(self.level.as_deref()).ok_or(TrainingError::LevelNameMissing)?;

        Ok(ValidatedRequest {
            language: self.language,
            instance_count,
            training_type: training_type.to_string(),
            scenario: scenario.to_string(),
            level: level.to_string(),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of a successful create-training call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingCreated {
    pub range_id: RangeId,
    /// Message from the range collaborator (typically access details).
    pub message: Option<String>,
}

/// What the collaborators produced before the commit.
struct Provisioned {
    activity_ids: Vec<String>,
    message: Option<String>,
}

/// Training manager for orchestrating cyber range sessions.
pub struct TrainingManager<C, R>
where
    C: ContentService,
    R: RangeService,
{
    config: CoordinatorConfig,
    active: SessionStore,
    saved: SessionStore,
    content: C,
    range: R,
}

impl<C, R> TrainingManager<C, R>
where
    C: ContentService,
    R: RangeService,
{
    /// Create a new training manager.
    #[must_use]
    pub const fn new(
        config: CoordinatorConfig,
        active: SessionStore,
        saved: SessionStore,
        content: C,
        range: R,
    ) -> Self {
        Self {
            config,
            active,
            saved,
            content,
            range,
        }
    }

    /// Coordinator configuration.
    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Active session store.
    #[must_use]
    pub const fn active_sessions(&self) -> &SessionStore {
        &self.active
    }

    /// Content collaborator.
    #[must_use]
    pub const fn content(&self) -> &C {
        &self.content
    }

    /// Range collaborator.
    #[must_use]
    pub const fn range(&self) -> &R {
        &self.range
    }

    /// Load the training catalog for a language.
    ///
    /// # Errors
    /// Returns [`TrainingError::TrainingSettingsLoading`] if the catalog is
    /// unreadable.
    pub async fn load_catalog(&self, language: Language) -> Result<TrainingCatalog, TrainingError> {
        let path = self.config.catalog_path(language);
        TrainingCatalog::load(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), "Cannot load training catalog: {e}");
            TrainingError::TrainingSettingsLoading(e)
        })
    }

    /// Allocate a range, publish its content, instantiate it and record the session.
    ///
    /// # Errors
    /// Returns the first failing step's error. Validation errors have no
    /// side effects; later errors release the reserved id first.
    pub async fn create_training(
        &self,
        user: &UserProfile,
        catalog: &TrainingCatalog,
        request: &CreateTrainingRequest,
    ) -> Result<TrainingCreated, TrainingError> {
        let request = request.validate()?;

        let range_id = self.active.reserve(self.config.max_sessions).await.map_err(|e| {
            tracing::warn!(user = %user.id, "Range id allocation failed: {e}");
            TrainingError::from(e)
        })?;
        tracing::info!(user = %user.id, %range_id, "Allocated session");

        let provisioned = match self.provision(user, catalog, &request, range_id).await {
            Ok(p) => p,
            Err(e) => {
                self.active.release(range_id).await;
                tracing::error!(user = %user.id, %range_id, "Training creation failed: {e}");
                return Err(e);
            }
        };

        let session = Session {
            name: Session::display_name(range_id),
            id: range_id,
            owner: user.id.clone(),
            created_at: Utc::now(),
            training_type: request.training_type,
            scenarios: vec![request.scenario],
            levels: vec![request.level],
            language: request.language.code().to_string(),
            instance_count: request.instance_count,
            activity_ids: provisioned.activity_ids,
        };

        self.active.commit(session).await.map_err(|e| {
            tracing::error!(user = %user.id, %range_id, "Cannot record training session: {e}");
            TrainingError::from(e)
        })?;
        tracing::info!(user = %user.id, %range_id, "Training session committed");

        Ok(TrainingCreated {
            range_id,
            message: provisioned.message,
        })
    }

    async fn provision(
        &self,
        user: &UserProfile,
        catalog: &TrainingCatalog,
        request: &ValidatedRequest,
        range_id: RangeId,
    ) -> Result<Provisioned, TrainingError> {
        let content_file = catalog
            .content_file(&request.scenario, &request.level)
            .ok_or(TrainingError::ContentIdentification)?;
        let range_file = catalog
            .range_file(&request.scenario, &request.level)
            .ok_or(TrainingError::TemplateIdentification)?;

        let content = tokio::fs::read_to_string(self.config.database_dir.join(content_file))
            .await
            .map_err(TrainingError::ContentLoading)?;
        let range_template = tokio::fs::read_to_string(self.config.database_dir.join(range_file))
            .await
            .map_err(TrainingError::TemplateLoading)?;

        tracing::info!(%range_id, "Uploading training content");
        let uploaded = self
            .content
            .upload_content(&user.id, range_id, &content)
            .await
            .map_err(|e| {
                if e.is_transport() {
                    TrainingError::ContentServer(e)
                } else {
                    TrainingError::ContentUpload(e)
                }
            })?;
        let activity_ids: Vec<String> = uploaded.activity_id.into_iter().collect();

        let descriptor = template::render(
            &range_template,
            &user.template_context(range_id, request.instance_count),
        );
        let progression = catalog.progression_scenario(&request.scenario, &request.level);

        tracing::info!(%range_id, "Instantiating cyber range");
        match self
            .range
            .instantiate_range(&user.id, range_id, &descriptor, progression)
            .await
        {
            Ok(reply) => Ok(Provisioned {
                activity_ids,
                message: reply.message,
            }),
            Err(e) => {
                if self.config.compensate_orphaned_content {
                    self.remove_orphaned_content(&user.id, range_id, &activity_ids)
                        .await;
                }
                Err(if e.is_transport() {
                    TrainingError::InstantiationServer(e)
                } else {
                    TrainingError::Instantiation(e)
                })
            }
        }
    }

    async fn remove_orphaned_content(
        &self,
        actor: &str,
        range_id: RangeId,
        activity_ids: &[String],
    ) {
        for activity_id in activity_ids {
            match self
                .content
                .remove_content(actor, range_id, activity_id)
                .await
            {
                Ok(_) => tracing::info!(%range_id, activity_id, "Removed orphaned content"),
                Err(e) => tracing::warn!(
                    %range_id,
                    activity_id,
                    "Orphaned content left on content manager: {e}"
                ),
            }
        }
    }

    /// Remove a session's content, destroy its range and drop its record.
    ///
    /// # Errors
    /// - [`TrainingError::SessionIdMissing`] / [`TrainingError::SessionIdInvalid`]
    ///   before any collaborator call
    /// - [`TrainingError::ContentRemoval`] if any activity removal fails
    /// - [`TrainingError::Destruction`] if the range survives; the record is kept
    /// - [`TrainingError::SessionInfoConsistency`] if the record vanished meanwhile
    pub async fn end_training(
        &self,
        owner: &str,
        range_id: Option<&str>,
    ) -> Result<(), TrainingError> {
        let raw = present(range_id).ok_or(TrainingError::SessionIdMissing)?;
        let range_id: RangeId = raw
            .parse()
            .map_err(|_| TrainingError::SessionIdInvalid(raw.to_string()))?;

        let activity_ids = self
            .active
            .activity_ids_for(range_id, owner)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user = owner, %range_id, "No such session for user");
                TrainingError::SessionIdInvalid(raw.to_string())
            })?;

        for activity_id in &activity_ids {
            tracing::info!(%range_id, activity_id, "Removing training content");
            self.content
                .remove_content(owner, range_id, activity_id)
                .await
                .map_err(|e| {
                    tracing::error!(%range_id, activity_id, "Content removal failed: {e}");
                    TrainingError::ContentRemoval(e)
                })?;
        }

        tracing::info!(%range_id, "Destroying cyber range");
        self.range
            .destroy_range(owner, range_id)
            .await
            .map_err(|e: CollaboratorError| {
                tracing::error!(%range_id, "Range destruction failed: {e}");
                TrainingError::Destruction(e)
            })?;

        if !self.active.remove(range_id, owner).await? {
            tracing::error!(%range_id, user = owner, "Session record disappeared during removal");
            return Err(TrainingError::SessionInfoConsistency);
        }
        tracing::info!(%range_id, user = owner, "Training session ended");
        Ok(())
    }

    /// Active sessions of `owner`.
    ///
    /// # Errors
    /// Returns error if the session store is unreadable.
    pub async fn sessions(&self, owner: &str) -> Result<Vec<Session>, TrainingError> {
        Ok(self.active.sessions_for_owner(owner).await?)
    }

    /// Saved configurations of `owner`.
    ///
    /// # Errors
    /// Returns error if the configuration store is unreadable.
    pub async fn configurations(&self, owner: &str) -> Result<Vec<Session>, TrainingError> {
        Ok(self.saved.sessions_for_owner(owner).await?)
    }
}
