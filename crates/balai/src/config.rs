//! Configuration management for balai.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the platform config dir.
const APP_DIR_NAME: &str = "balai";

/// Environment variable prefix for all settings.
const ENV_PREFIX: &str = "BALAI_";

/// Username used when no admin credentials are configured.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password used when no admin credentials are configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Legacy environment variables `PORT`, `ADMIN_USER`, `ADMIN_PASS`
/// 2. Environment variables prefixed with `BALAI_` (nested with `__`)
/// 3. TOML config file at `~/.config/balai/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Admin panel configuration.
    pub admin: AdminConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `news.json` and `complaints.json`.
    pub data_dir: PathBuf,
}

/// Admin panel configuration.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin username.
    pub username: Option<String>,
    /// Admin password. Never serialized back out.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Refuse to start without explicitly configured credentials.
    pub require_credentials: bool,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("require_credentials", &self.require_credentials)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// The username/password pair checked by the admin gate.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Expected username.
    pub username: String,
    /// Expected password.
    pub password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Build a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(legacy_env())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults layered under the given TOML provider.
    fn figment(toml: figment::providers::Data<Toml>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(toml)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config_validation("server.port must be greater than 0"));
        }

        if self.server.bind.trim().is_empty() {
            return Err(Error::config_validation("server.bind must not be empty"));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(Error::config_validation("storage.data_dir must not be empty"));
        }

        if self.admin.require_credentials && self.uses_default_credentials() {
            return Err(Error::config_validation(
                "admin.require_credentials is set but admin.username and admin.password are not both configured",
            ));
        }

        Ok(())
    }

    /// Address the HTTP server listens on, as `host:port`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Path to the news collection file.
    #[must_use]
    pub fn news_path(&self) -> PathBuf {
        self.storage.data_dir.join(crate::store::CollectionName::News.file_name())
    }

    /// Path to the complaints collection file.
    #[must_use]
    pub fn complaints_path(&self) -> PathBuf {
        self.storage
            .data_dir
            .join(crate::store::CollectionName::Complaints.file_name())
    }

    /// Whether the admin gate falls back to the built-in default credential.
    #[must_use]
    pub fn uses_default_credentials(&self) -> bool {
        non_blank(self.admin.username.as_deref()).is_none()
            || non_blank(self.admin.password.as_deref()).is_none()
    }

    /// Whether exactly one of username and password is configured. The
    /// other half is ignored and the default credential applies.
    #[must_use]
    pub fn has_partial_credentials(&self) -> bool {
        non_blank(self.admin.username.as_deref()).is_some()
            != non_blank(self.admin.password.as_deref()).is_some()
    }

    /// Resolve the credentials checked by the admin gate.
    #[must_use]
    pub fn admin_credentials(&self) -> AdminCredentials {
        match (
            non_blank(self.admin.username.as_deref()),
            non_blank(self.admin.password.as_deref()),
        ) {
            (Some(username), Some(password)) => AdminCredentials::new(username, password),
            _ => AdminCredentials::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD),
        }
    }
}

/// Environment variables understood by earlier deployments of the site.
fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        let mapped = match key.as_str() {
            k if k.eq_ignore_ascii_case("PORT") => "server.port",
            k if k.eq_ignore_ascii_case("ADMIN_USER") => "admin.username",
            k if k.eq_ignore_ascii_case("ADMIN_PASS") => "admin.password",
            _ => return None,
        };
        Some(mapped.into())
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
