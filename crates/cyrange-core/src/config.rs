//! Coordinator configuration.

use std::{
    fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "CYRANGE_CONFIG";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Training content language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    /// Wire code of the language.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ja => "ja",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "ja" => Ok(Self::Ja),
            other => Err(other.to_string()),
        }
    }
}

/// Coordinator settings. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Address the coordinator listens on.
    pub listen_addr: SocketAddr,
    /// Directory holding the users database, catalogs and descriptors.
    pub database_dir: PathBuf,
    /// Users database, relative to `database_dir`.
    pub users_file: String,
    /// English training catalog, relative to `database_dir`.
    pub catalog_file_en: String,
    /// Japanese training catalog, relative to `database_dir`.
    pub catalog_file_ja: String,
    /// Active session store, relative to the working directory.
    pub active_sessions_file: PathBuf,
    /// Saved configuration store, relative to the working directory.
    pub saved_configurations_file: PathBuf,
    /// Size of the range id pool.
    pub max_sessions: u32,
    /// Content collaborator endpoint.
    pub content_server_url: String,
    /// Range collaborator endpoint.
    pub range_server_url: String,
    /// Per-request collaborator timeout in seconds.
    pub request_timeout_secs: u64,
    /// Reject requests without a verified password.
    pub require_password: bool,
    /// Remove freshly published content when range instantiation fails.
    pub compensate_orphaned_content: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8082)),
            database_dir: PathBuf::from("../database"),
            users_file: "users.yml".to_string(),
            catalog_file_en: "training-en.yml".to_string(),
            catalog_file_ja: "training-ja.yml".to_string(),
            active_sessions_file: PathBuf::from("active_sessions.json"),
            saved_configurations_file: PathBuf::from("saved_configurations.json"),
            max_sessions: 5,
            content_server_url: "http://127.0.0.1:8084".to_string(),
            range_server_url: "http://127.0.0.1:8083".to_string(),
            request_timeout_secs: 600,
            require_password: true,
            compensate_orphaned_content: false,
        }
    }
}

impl CoordinatorConfig {
    /// Parse a TOML configuration document.
    ///
    /// # Errors
    /// Returns error if the TOML is malformed.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load from the file named by [`CONFIG_ENV`], or fall back to defaults.
    ///
    /// # Errors
    /// Returns error if the named file cannot be read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Absolute path of the users database.
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.database_dir.join(&self.users_file)
    }

    /// Path of the training catalog for a language.
    #[must_use]
    pub fn catalog_path(&self, language: Language) -> PathBuf {
        match language {
            Language::En => self.database_dir.join(&self.catalog_file_en),
            Language::Ja => self.database_dir.join(&self.catalog_file_ja),
        }
    }

    /// Collaborator request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
