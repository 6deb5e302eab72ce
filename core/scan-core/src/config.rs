//! Scanner configuration loading.
//!
//! Handles paths and parsing for `~/.ticket-scan/config.toml`. A missing file
//! yields defaults; a malformed one is an error rather than a silent reset.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ScanError};

pub const CONFIG_ENV: &str = "TICKET_SCAN_CONFIG";
pub const URL_ENV: &str = "TICKET_SCAN_URL";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

const CONFIG_DIR_NAME: &str = ".ticket-scan";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Deployed web app endpoint answering `?action=...&ticketId=...`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    pub request_timeout_ms: u64,
    /// Failed check-ins allowed per pending ticket; 0 = unlimited.
    pub max_confirm_attempts: u32,
    /// Check in found tickets without waiting for the operator.
    pub auto_confirm: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_confirm_attempts: 0,
            auto_confirm: false,
        }
    }
}

impl ScannerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn service_url(&self) -> Result<&str> {
        self.service_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ScanError::MissingServiceUrl)
    }

    /// Applies `TICKET_SCAN_URL` over the file value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(URL_ENV) {
            if !url.trim().is_empty() {
                self.service_url = Some(url);
            }
        }
        self
    }
}

/// Returns the path to the scanner directory (~/.ticket-scan).
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME))
}

/// Returns the config file path, honoring `TICKET_SCAN_CONFIG`.
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    get_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Loads configuration from `path` (or the default location), returning
/// defaults when the file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match get_config_path() {
            Some(path) => path,
            None => return Ok(ScannerConfig::default()),
        },
    };

    if !config_path.exists() {
        return Ok(ScannerConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| ScanError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;
    toml::from_str::<ScannerConfig>(&content).map_err(|err| ScanError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}
