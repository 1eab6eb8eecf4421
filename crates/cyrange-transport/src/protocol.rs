//! Wire protocol for client-server communication.
//!
//! Clients post form-encoded fields. Every reply is a JSON array of
//! objects; the first carries `status` and, optionally, `message`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reply status key.
pub const STATUS_KEY: &str = "status";
/// Reply message key.
pub const MESSAGE_KEY: &str = "message";
/// Successful status value.
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Failed status value.
pub const STATUS_ERROR: &str = "ERROR";

/// Action requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAction {
    /// Training types and scenario names for the requested language.
    FetchContent,
    /// Allocate and provision a new training session.
    CreateTraining,
    /// Saved configurations of the caller.
    GetConfigurations,
    /// Active sessions of the caller.
    GetSessions,
    /// Tear down one of the caller's sessions.
    EndTraining,
}

impl ClientAction {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchContent => "fetch_content",
            Self::CreateTraining => "create_training",
            Self::GetConfigurations => "get_configurations",
            Self::GetSessions => "get_sessions",
            Self::EndTraining => "end_training",
        }
    }
}

impl fmt::Display for ClientAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch_content" => Ok(Self::FetchContent),
            "create_training" => Ok(Self::CreateTraining),
            "get_configurations" => Ok(Self::GetConfigurations),
            "get_sessions" => Ok(Self::GetSessions),
            "end_training" => Ok(Self::EndTraining),
            other => Err(other.to_string()),
        }
    }
}

/// Form fields posted by a client. Every field is optional on the wire.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientRequest {
    pub user: Option<String>,
    pub password: Option<String>,
    pub action: Option<String>,
    pub lang: Option<String>,
    pub count: Option<String>,
    #[serde(rename = "type")]
    pub training_type: Option<String>,
    pub scenario: Option<String>,
    pub level: Option<String>,
    pub range_id: Option<String>,
}

impl fmt::Debug for ClientRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRequest")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("action", &self.action)
            .field("lang", &self.lang)
            .field("count", &self.count)
            .field("training_type", &self.training_type)
            .field("scenario", &self.scenario)
            .field("level", &self.level)
            .field("range_id", &self.range_id)
            .finish()
    }
}

/// Reply sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerResponse {
    records: Vec<Map<String, Value>>,
}

impl ServerResponse {
    fn with_status(status: &str) -> Self {
        let mut first = Map::new();
        first.insert(STATUS_KEY.to_string(), Value::from(status));
        Self {
            records: vec![first],
        }
    }

    /// Successful reply with no payload.
    #[must_use]
    pub fn success() -> Self {
        Self::with_status(STATUS_SUCCESS)
    }

    /// Failed reply carrying a user-facing message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_status(STATUS_ERROR).with_field(MESSAGE_KEY, Value::String(message.into()))
    }

    /// Add a message to the first object, if any.
    #[must_use]
    pub fn with_message(self, message: Option<String>) -> Self {
        match message {
            Some(m) => self.with_field(MESSAGE_KEY, Value::String(m)),
            None => self,
        }
    }

    /// Merge a field into the first object.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        if let Some(first) = self.records.first_mut() {
            first.insert(key.to_string(), value);
        }
        self
    }

    /// Append a further object holding a single field.
    #[must_use]
    pub fn with_object(mut self, key: &str, value: Value) -> Self {
        let mut object = Map::new();
        object.insert(key.to_string(), value);
        self.records.push(object);
        self
    }

    /// Whether the status is `SUCCESS`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == Some(STATUS_SUCCESS)
    }

    /// Status of the reply.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.records.first()?.get(STATUS_KEY)?.as_str()
    }

    /// Message of the reply, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.records.first()?.get(MESSAGE_KEY)?.as_str()
    }

    /// Reply objects in wire order.
    #[must_use]
    pub fn records(&self) -> &[Map<String, Value>] {
        &self.records
    }
}
