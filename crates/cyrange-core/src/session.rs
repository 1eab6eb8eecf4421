//! Range identifiers and persisted training session records.

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric cyber range identifier.
///
/// Ids are compared as integers but exchanged as decimal strings,
/// both on the wire and in the persisted store. Zero is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeId(NonZeroU32);

/// Range id parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeIdError {
    #[error("Range id is empty")]
    Empty,
    #[error("Range id is not a decimal number: {0}")]
    NotDecimal(String),
    #[error("Range id must be positive")]
    Zero,
}

impl RangeId {
    /// Create a range id from a raw value; `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RangeId {
    type Err = RangeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RangeIdError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeIdError::NotDecimal(s.to_string()));
        }
        let value: u32 = s
            .parse()
            .map_err(|_| RangeIdError::NotDecimal(s.to_string()))?;
        Self::new(value).ok_or(RangeIdError::Zero)
    }
}

impl TryFrom<String> for RangeId {
    type Error = RangeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RangeId> for String {
    fn from(id: RangeId) -> Self {
        id.to_string()
    }
}

/// One active training session (or saved configuration).
///
/// Field names in the serialized form follow the persisted document layout,
/// which operators read and edit by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display name, e.g. `Training Session #3`.
    pub name: String,
    /// Allocated range id.
    pub id: RangeId,
    /// Owning user id.
    #[serde(rename = "user")]
    pub owner: String,
    /// Creation time.
    #[serde(rename = "time")]
    pub created_at: DateTime<Utc>,
    /// Training type.
    #[serde(rename = "type")]
    pub training_type: String,
    /// Scenario names.
    pub scenarios: Vec<String>,
    /// Level names, parallel to `scenarios`.
    pub levels: Vec<String>,
    /// Requested language code.
    pub language: String,
    /// Requested instance count.
    #[serde(rename = "count")]
    pub instance_count: u32,
    /// Activity ids handed out by the content collaborator.
    #[serde(default)]
    pub activity_ids: Vec<String>,
}

impl Session {
    /// Default display name for a session on the given range.
    #[must_use]
    pub fn display_name(id: RangeId) -> String {
        format!("Training Session #{id}")
    }

    /// Whether this record belongs to `owner` and sits on range `id`.
    #[must_use]
    pub fn matches(&self, id: RangeId, owner: &str) -> bool {
        self.id == id && self.owner == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_id_parse() {
        assert_eq!("7".parse::<RangeId>().unwrap().get(), 7);
        assert_eq!(" 12 ".parse::<RangeId>().unwrap().get(), 12);
        assert_eq!("0".parse::<RangeId>(), Err(RangeIdError::Zero));
        assert_eq!("".parse::<RangeId>(), Err(RangeIdError::Empty));
        assert!(matches!("-1".parse::<RangeId>(), Err(RangeIdError::NotDecimal(_))));
        assert!(matches!("1a".parse::<RangeId>(), Err(RangeIdError::NotDecimal(_))));
    }

    #[test]
    fn test_range_id_is_a_decimal_string_on_the_wire() {
        let id = RangeId::new(4).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"4\"");
        assert!(serde_json::from_str::<RangeId>("4").is_err());
        assert!(serde_json::from_str::<RangeId>("\"0\"").is_err());
    }

    #[test]
    fn test_session_document_field_names() {
        let session = Session {
            name: Session::display_name(RangeId::new(2).unwrap()),
            id: RangeId::new(2).unwrap(),
            owner: "john_doe".into(),
            created_at: Utc::now(),
            training_type: "Scenario-Based Training".into(),
            scenarios: vec!["Incident Response".into()],
            levels: vec!["Level 1 (Easy)".into()],
            language: "en".into(),
            instance_count: 2,
            activity_ids: vec!["41".into()],
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["name"], "Training Session #2");
        assert_eq!(value["id"], "2");
        assert_eq!(value["user"], "john_doe");
        assert_eq!(value["type"], "Scenario-Based Training");
        assert_eq!(value["count"], 2);
        assert_eq!(value["activity_ids"][0], "41");
        assert!(value.get("time").is_some());

        let back: Session = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }
}
