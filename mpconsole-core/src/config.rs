//! Console configuration handling.
//!
//! Configuration is read from `console.toml` in the platform config directory
//! (`~/.config/mpconsole/console.toml` on Linux). Every field has a default, so
//! a missing file is not an error. `MPCONSOLE_BASE_URL` and
//! `MPCONSOLE_TIMEOUT_MS` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::SessionBackend;
use crate::transport::DEFAULT_TIMEOUT_MS;

/// Environment variable overriding [`ConsoleConfig::base_url`].
pub const ENV_BASE_URL: &str = "MPCONSOLE_BASE_URL";

/// Environment variable overriding [`ConsoleConfig::timeout_ms`].
pub const ENV_TIMEOUT_MS: &str = "MPCONSOLE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// API root, e.g. `http://127.0.0.1:8001/api/v1`.
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Route of the login screen.
    pub login_route: String,

    /// Route entered after login when no destination was remembered.
    pub home_route: String,

    /// Where the session credential is kept.
    pub session_backend: SessionBackend,

    /// Session file location for the `file` backend.
    pub session_file: Option<PathBuf>,

    /// Treat HTTP 401 on a credentialed request as session expiry.
    pub http_401_expires_session: bool,

    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Path of the file this configuration was loaded from.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001/api/v1".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            login_route: "/login".to_string(),
            home_route: "/".to_string(),
            session_backend: SessionBackend::default(),
            session_file: None,
            http_401_expires_session: true,
            log_level: "info".to_string(),
            config_path: None,
        }
    }
}

impl ConsoleConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })
    }

    /// Apply environment overrides from a lookup function.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = timeout.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "timeout_ms",
                message: format!("{}: {}", timeout, e),
            })?;
        }
        Ok(())
    }

    /// Check values that would otherwise fail later and less clearly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
            field: "base_url",
            message: format!("{}: {}", self.base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "base_url",
                message: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        for (field, route) in [
            ("login_route", &self.login_route),
            ("home_route", &self.home_route),
        ] {
            if !route.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("route must start with '/': {}", route),
                });
            }
        }
        Ok(())
    }
}

/// Default configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("console.toml"))
}

/// Load configuration from the default location, or defaults if absent.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    let path = default_config_path().unwrap_or_else(|| PathBuf::from("mpconsole.toml"));
    load_config_from(&path)
}

/// Load configuration from `path`, or defaults if the file does not exist.
///
/// Environment overrides are applied and the result is validated.
pub fn load_config_from(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        ConsoleConfig::from_toml(&contents, path)?
    } else {
        ConsoleConfig::default()
    };

    config.config_path = Some(path.to_path_buf());
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mpconsole", "mpconsole")
}
