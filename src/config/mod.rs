//! Configuration management for credkeeper

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::session::RenewalPolicy;
use crate::store::StoreBackend;

/// Directory under the home directory holding config and session files
const CONFIG_DIR: &str = ".credkeeper";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the web application API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Path of the authentication service below `api_url`
    #[serde(default = "default_auth_path")]
    pub auth_path: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Where the session is persisted between runs
    #[serde(default)]
    pub store: StoreBackend,

    /// Explicit location of the session store (defaults under ~/.credkeeper)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// How concurrent credential renewals are coordinated
    #[serde(default)]
    pub renewal: RenewalPolicy,
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_auth_path() -> String {
    "/api/auth".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth_path: default_auth_path(),
            timeout_secs: default_timeout_secs(),
            store: StoreBackend::default(),
            store_path: None,
            renewal: RenewalPolicy::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.credkeeper/config.yaml)
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.yaml"))
    }

    /// Resolve the config path from an optional override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path override.
    ///
    /// A missing file yields the defaults so the tool works without setup.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that URLs and the timeout are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            ))
            .into());
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()).into());
        }
        Ok(())
    }

    /// Apply a runtime API URL override (flag or environment)
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url.to_string();
        }
        self
    }

    /// Full base URL of the authentication service
    pub fn auth_url(&self) -> String {
        join_url(&self.api_url, &self.auth_path)
    }

    /// Path of an auth service endpoint relative to `api_url`
    pub fn auth_endpoint(&self, endpoint: &str) -> String {
        join_url(&self.auth_path, endpoint)
    }

    /// Location of the session store, defaulting under ~/.credkeeper
    pub fn store_location(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        let file = match self.store {
            StoreBackend::Sqlite => "session.db",
            StoreBackend::File | StoreBackend::Memory => "session.yaml",
        };
        Ok(config_dir()?.join(file))
    }
}

fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::Invalid(
        "Could not determine home directory".to_string(),
    ))?;
    Ok(home.join(CONFIG_DIR))
}

/// Join a base URL and a path without doubling or dropping the slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}
