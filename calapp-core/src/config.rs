//! Application configuration.
//!
//! Layered, lowest precedence first: built-in defaults, then
//! `~/.config/calapp/config.toml`, then `CALAPP_*` environment variables
//! (e.g. `CALAPP_API_URL`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalAppError, CalAppResult};

static DEFAULT_API_URL: &str = "http://localhost:4000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// How long a login/register error stays visible before it is cleared.
const DEFAULT_ERROR_MESSAGE_TTL_MS: u64 = 10;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_error_message_ttl_ms() -> u64 {
    DEFAULT_ERROR_MESSAGE_TTL_MS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_error_message_ttl_ms")]
    pub error_message_ttl_ms: u64,

    /// Where the session token and view preference are kept.
    /// Defaults to `<data dir>/calapp/storage.toml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: default_api_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            error_message_ttl_ms: DEFAULT_ERROR_MESSAGE_TTL_MS,
            storage_path: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> CalAppResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalAppError::Config("Could not determine config directory".into()))?
            .join("calapp");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template there
    /// on first run.
    pub fn load() -> CalAppResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file (which may be missing) plus the environment.
    pub fn load_from(path: &Path) -> CalAppResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALAPP").try_parsing(true))
            .build()
            .map_err(|e| CalAppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalAppError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn error_message_ttl(&self) -> Duration {
        Duration::from_millis(self.error_message_ttl_ms)
    }

    /// Resolved storage file path, with `~` expanded.
    pub fn storage_path(&self) -> CalAppResult<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(PathBuf::from(
                shellexpand::tilde(&path.to_string_lossy()).into_owned(),
            )),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| CalAppError::Config("Could not determine data directory".into()))?
                .join("calapp")
                .join("storage.toml")),
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalAppResult<()> {
        let contents = format!(
            "\
# calapp configuration

# Calendar API the client talks to:
# api_url = \"{}\"

# Seconds before a request is abandoned:
# request_timeout_secs = {}

# Milliseconds a sign-in error stays visible:
# error_message_ttl_ms = {}

# Where the session token is kept:
# storage_path = \"~/.local/share/calapp/storage.toml\"
",
            DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_ERROR_MESSAGE_TTL_MS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalAppError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalAppError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
