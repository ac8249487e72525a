use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::UniCircleError;

pub const ENV_BACKEND: &str = "UNICIRCLE_BACKEND";
pub const ENV_COLLECTION_API_URL: &str = "UNICIRCLE_COLLECTION_API_URL";
pub const ENV_USER: &str = "UNICIRCLE_USER";
pub const ENV_API_KEY: &str = "UNICIRCLE_API_KEY";

/// Which collection backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Key-value tables in the local database.
    #[default]
    Local,
    /// The remote Collection Service.
    Http,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "http" | "rest" => Ok(BackendKind::Http),
            _ => Err(format!("unknown backend: {s}")),
        }
    }
}

/// Top-level configuration, stored at `~/.unicircle/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniCircleConfig {
    /// Backend used for collection operations.
    #[serde(default)]
    pub backend: BackendKind,

    /// Base URL of the Collection Service.
    #[serde(default = "default_collection_api_url")]
    pub collection_api_url: Url,

    /// Per-request timeout for the Collection Service.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User id the CLI acts as when `--user` is not given.
    #[serde(default)]
    pub default_user: Option<String>,
}

fn default_collection_api_url() -> Url {
    Url::parse("http://localhost:8080/api/collections").expect("static URL is valid")
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for UniCircleConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            collection_api_url: default_collection_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_user: None,
        }
    }
}

impl UniCircleConfig {
    /// Returns the UniCircle home directory (`~/.unicircle/`).
    pub fn home_dir() -> Result<PathBuf, UniCircleError> {
        let base = dirs::home_dir().ok_or_else(|| UniCircleError::Config {
            message: "could not determine home directory".into(),
        })?;
        Ok(base.join(".unicircle"))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Result<PathBuf, UniCircleError> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Returns the path to the local database file.
    pub fn db_path() -> Result<PathBuf, UniCircleError> {
        Ok(Self::home_dir()?.join("unicircle.db"))
    }

    /// Load config from the default location (or defaults), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, UniCircleError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load_from(&path)?
        } else {
            tracing::debug!("no config file, using defaults");
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, UniCircleError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| UniCircleError::Serialization(e.to_string()))
    }

    /// Override fields from environment variables. `lookup` is
    /// `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), UniCircleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_BACKEND) {
            tracing::debug!(backend = %raw, "backend overridden from environment");
            self.backend = raw.parse().map_err(|message| UniCircleError::Config { message })?;
        }
        if let Some(raw) = lookup(ENV_COLLECTION_API_URL) {
            self.collection_api_url = Url::parse(&raw).map_err(|e| UniCircleError::Config {
                message: format!("invalid {ENV_COLLECTION_API_URL}: {e}"),
            })?;
        }
        if let Some(user) = lookup(ENV_USER).filter(|u| !u.trim().is_empty()) {
            self.default_user = Some(user);
        }
        Ok(())
    }

    /// Set one field by its TOML name, as `unicircle config set` does.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), UniCircleError> {
        let value = value.trim();
        match key {
            "backend" => {
                self.backend = value.parse().map_err(|message| UniCircleError::Config { message })?;
            }
            "collection_api_url" => {
                self.collection_api_url = Url::parse(value).map_err(|e| UniCircleError::Config {
                    message: format!("invalid collection_api_url: {e}"),
                })?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(UniCircleError::Config {
                            message: format!("request_timeout_secs must be a positive integer, got '{value}'"),
                        })
                    }
                };
            }
            "default_user" => {
                self.default_user = Some(value.to_string()).filter(|u| !u.is_empty());
            }
            other => {
                return Err(UniCircleError::Config {
                    message: format!("unknown config key: {other}"),
                })
            }
        }
        Ok(())
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<(), UniCircleError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), UniCircleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| UniCircleError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Initialize the UniCircle home directory with default config.
    pub fn init() -> Result<PathBuf, UniCircleError> {
        let home = Self::home_dir()?;
        std::fs::create_dir_all(&home)?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
        }

        Ok(home)
    }
}
