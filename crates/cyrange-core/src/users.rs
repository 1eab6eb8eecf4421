//! User directory (users database) and per-user template bindings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{context::TemplateContext, session::RangeId};

/// Template variable for the host management address.
pub const HOST_MGMT_ADDR: &str = "host_mgmt_addr";
/// Template variable for the host virtual bridge address.
pub const HOST_VIRBR_ADDR: &str = "host_virbr_addr";
/// Template variable for the host account.
pub const HOST_ACCOUNT: &str = "host_account";

/// User directory error.
#[derive(Debug, Error)]
pub enum UserDirectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed users database: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One registered user and the range host they train on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub id: String,
    /// Stored password hash, if any.
    #[serde(default)]
    pub password: Option<String>,
    pub host_mgmt_addr: String,
    pub host_virbr_addr: String,
    pub host_account: String,
}

impl UserProfile {
    /// Bindings for materializing a range descriptor on behalf of this user.
    #[must_use]
    pub fn template_context(&self, range_id: RangeId, instance_count: u32) -> TemplateContext {
        [
            (HOST_MGMT_ADDR, self.host_mgmt_addr.as_str()),
            (HOST_VIRBR_ADDR, self.host_virbr_addr.as_str()),
            (HOST_ACCOUNT, self.host_account.as_str()),
        ]
        .into_iter()
        .collect::<TemplateContext>()
        .with_range(range_id, instance_count)
    }
}

/// All registered users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDirectory {
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

impl UserDirectory {
    /// Parse a users database document.
    ///
    /// # Errors
    /// Returns error if the YAML is malformed.
    pub fn from_yaml(text: &str) -> Result<Self, UserDirectoryError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the users database from disk.
    ///
    /// The file is edited externally, so callers reload it per request.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, UserDirectoryError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&text)
    }

    /// Look up a user by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;

    const USERS: &str = r"
users:
  - name: John Doe
    id: john_doe
    password: $2b$12$abcdefghijklmnopqrstuv
    host_mgmt_addr: 172.16.1.7
    host_virbr_addr: 192.168.122.1
    host_account: cyuser
  - name: Jane Roe
    id: jane_roe
    host_mgmt_addr: 172.16.1.8
    host_virbr_addr: 192.168.122.1
    host_account: cyuser2
";

    #[test]
    fn test_parse_and_find() {
        let dir = UserDirectory::from_yaml(USERS).unwrap();
        assert_eq!(dir.users.len(), 2);
        let john = dir.find("john_doe").unwrap();
        assert_eq!(john.name, "John Doe");
        assert!(john.password.is_some());
        assert!(dir.find("jane_roe").unwrap().password.is_none());
        assert!(dir.find("nobody").is_none());
    }

    #[test]
    fn test_malformed_directory() {
        assert!(matches!(
            UserDirectory::from_yaml("users: [ {id: "),
            Err(UserDirectoryError::Parse(_))
        ));
    }

    #[test]
    fn test_template_context_for_user() {
        let dir = UserDirectory::from_yaml(USERS).unwrap();
        let ctx = dir
            .find("john_doe")
            .unwrap()
            .template_context(RangeId::new(3).unwrap(), 2);
        let out = template::render(
            "mgmt: {{ host_mgmt_addr }}\naccount: {{ host_account }}\n\
             range: {{ clone_range_id }}\ncount: {{ clone_instance_number }}",
            &ctx,
        );
        assert_eq!(out, "mgmt: 172.16.1.7\naccount: cyuser\nrange: 3\ncount: 2");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = UserDirectory::load("/nonexistent/users.yml").await.unwrap_err();
        assert!(matches!(err, UserDirectoryError::Io(_)));
    }
}
