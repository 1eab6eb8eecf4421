//! Shared test fixtures: a throwaway database directory and fake collaborators.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use cyrange_core::{
    CollaboratorError, CollaboratorReply, ContentService, CoordinatorConfig, RangeId, RangeService,
};
use cyrange_session::{
    SessionStore, TrainingManager,
    storage::{JsonFileStorage, MemoryStorage},
};
use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::{auth::AcceptAnyPassword, coordinator::Coordinator, protocol::ClientRequest};

const USERS: &str = r"
users:
  - name: Alice
    id: alice
    password: pw
    host_mgmt_addr: 10.0.0.1
    host_virbr_addr: 192.168.122.1
    host_account: cyuser
  - name: Bob
    id: bob
    password: pw
    host_mgmt_addr: 10.0.0.2
    host_virbr_addr: 192.168.122.1
    host_account: cyuser
  - name: No Password
    id: nopass
    host_mgmt_addr: 10.0.0.3
    host_virbr_addr: 192.168.122.1
    host_account: cyuser
";

const CATALOG: &str = r"
types:
  - name: Scenario-Based Training
    category: Attack
scenarios:
  - name: Incident Response
    levels:
      - name: Level 1 (Easy)
        content: ir1-content.yml
        specification: ir1-range.yml
";

/// Collaborator that always succeeds.
#[derive(Debug, Default)]
pub struct FakeCollaborator;

#[async_trait]
impl ContentService for FakeCollaborator {
    async fn upload_content(
        &self,
        _actor: &str,
        range_id: RangeId,
        _descriptor: &str,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        Ok(CollaboratorReply {
            message: None,
            activity_id: Some(format!("act-{range_id}")),
        })
    }

    async fn remove_content(
        &self,
        _actor: &str,
        _range_id: RangeId,
        _activity_id: &str,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        Ok(CollaboratorReply::default())
    }
}

#[async_trait]
impl RangeService for FakeCollaborator {
    async fn instantiate_range(
        &self,
        _actor: &str,
        range_id: RangeId,
        _descriptor: &str,
        _progression_scenario: Option<&str>,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        Ok(CollaboratorReply {
            message: Some(format!("range {range_id} ready")),
            activity_id: None,
        })
    }

    async fn destroy_range(
        &self,
        _actor: &str,
        _range_id: RangeId,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        Ok(CollaboratorReply::default())
    }
}

pub type TestCoordinator = Coordinator<FakeCollaborator, FakeCollaborator, AcceptAnyPassword>;

pub struct Fixture {
    pub dir: TempDir,
    pub coordinator: Arc<TestCoordinator>,
}

pub type TestManager = TrainingManager<FakeCollaborator, FakeCollaborator>;

/// Manager over the database in `dir`, with the store paths wired as the binary does.
pub fn manager(dir: &Path, require_password: bool) -> TestManager {
    let config = CoordinatorConfig {
        database_dir: dir.to_path_buf(),
        active_sessions_file: dir.join("active_sessions.json"),
        require_password,
        ..CoordinatorConfig::default()
    };
    let active = SessionStore::new(JsonFileStorage::new(&config.active_sessions_file));
    let saved = SessionStore::new(MemoryStorage::new());
    TrainingManager::new(config, active, saved, FakeCollaborator, FakeCollaborator)
}

pub fn fixture(require_password: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("users.yml"), USERS).unwrap();
    std::fs::write(dir.path().join("training-en.yml"), CATALOG).unwrap();
    std::fs::write(dir.path().join("ir1-content.yml"), "content: ir1").unwrap();
    std::fs::write(dir.path().join("ir1-range.yml"), "host: {{host_mgmt_addr}}").unwrap();

    let coordinator = Arc::new(Coordinator::new(
        manager(dir.path(), require_password),
        AcceptAnyPassword,
    ));
    Fixture { dir, coordinator }
}

/// Build a request from form pairs.
pub fn form(fields: &[(&str, &str)]) -> ClientRequest {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
        .collect();
    serde_json::from_value(Value::Object(map)).unwrap()
}
