//! Collaborator wire protocol.
//!
//! Requests are form-encoded POST bodies with a fixed field set. Replies are
//! a JSON array of objects; exactly one of them carries `status`, next to an
//! optional `message` or `activity_id`.

use cyrange_core::{CollaboratorError, CollaboratorReply, RangeId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Key of the status field.
pub const STATUS_KEY: &str = "status";
/// Status value for success.
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Status value for failure.
pub const STATUS_ERROR: &str = "ERROR";
/// Key of the free-form message field.
pub const MESSAGE_KEY: &str = "message";
/// Key of the activity id field.
pub const ACTIVITY_ID_KEY: &str = "activity_id";

/// Action requested from a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorAction {
    UploadContent,
    RemoveContent,
    InstantiateRange,
    DestroyRange,
}

/// Form body sent to a collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorRequest {
    /// Acting user id.
    pub user: String,
    pub action: CollaboratorAction,
    pub range_id: RangeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progression_scenario: Option<String>,
}

impl CollaboratorRequest {
    fn new(actor: &str, action: CollaboratorAction, range_id: RangeId) -> Self {
        Self {
            user: actor.to_string(),
            action,
            range_id,
            description_file: None,
            activity_id: None,
            progression_scenario: None,
        }
    }

    /// Publish content for a range.
    #[must_use]
    pub fn upload_content(actor: &str, range_id: RangeId, descriptor: &str) -> Self {
        Self {
            description_file: Some(descriptor.to_string()),
            ..Self::new(actor, CollaboratorAction::UploadContent, range_id)
        }
    }

    /// Remove one published activity.
    #[must_use]
    pub fn remove_content(actor: &str, range_id: RangeId, activity_id: &str) -> Self {
        Self {
            activity_id: Some(activity_id.to_string()),
            ..Self::new(actor, CollaboratorAction::RemoveContent, range_id)
        }
    }

    /// Instantiate a range.
    #[must_use]
    pub fn instantiate_range(
        actor: &str,
        range_id: RangeId,
        descriptor: &str,
        progression_scenario: Option<&str>,
    ) -> Self {
        Self {
            description_file: Some(descriptor.to_string()),
            progression_scenario: progression_scenario.map(str::to_string),
            ..Self::new(actor, CollaboratorAction::InstantiateRange, range_id)
        }
    }

    /// Destroy a range.
    #[must_use]
    pub fn destroy_range(actor: &str, range_id: RangeId) -> Self {
        Self::new(actor, CollaboratorAction::DestroyRange, range_id)
    }
}

/// Parse a collaborator reply body.
///
/// # Errors
/// - [`CollaboratorError::Rejected`] when the status is `ERROR`
/// - [`CollaboratorError::Parse`] when the body is not the expected shape,
///   no record carries a status, or the status value is unknown
pub fn parse_reply(body: &str) -> Result<CollaboratorReply, CollaboratorError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Parse(e.to_string()))?;

    let records: Vec<Map<String, Value>> = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(map) => vec![map],
        other => {
            return Err(CollaboratorError::Parse(format!(
                "expected an array of objects, got {other}"
            )));
        }
    };

    let status_record = records
        .iter()
        .find(|r| r.contains_key(STATUS_KEY))
        .ok_or_else(|| CollaboratorError::Parse(format!("no `{STATUS_KEY}` field in reply")))?;

    let message = field(status_record, MESSAGE_KEY)
        .or_else(|| records.iter().find_map(|r| field(r, MESSAGE_KEY)));
    let activity_id = field(status_record, ACTIVITY_ID_KEY)
        .or_else(|| records.iter().find_map(|r| field(r, ACTIVITY_ID_KEY)));

    match status_record.get(STATUS_KEY) {
        Some(Value::String(s)) if s == STATUS_SUCCESS => Ok(CollaboratorReply {
            message,
            activity_id,
        }),
        Some(Value::String(s)) if s == STATUS_ERROR => Err(CollaboratorError::Rejected { message }),
        Some(other) => Err(CollaboratorError::Parse(format!("unknown status {other}"))),
        None => Err(CollaboratorError::Parse(format!("no `{STATUS_KEY}` field in reply"))),
    }
}

fn field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
