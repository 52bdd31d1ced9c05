//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `CONTACTS_API_URL` - Backend base URL (default: `http://localhost:5000/api`)
//! - `CONTACTS_API_FLAVOR` - `standard` or `simple` (default: `standard`)
//! - `CONTACTS_SESSION_FILE` - Where the session is persisted
//!   (default: `.contacts-session.json`)
//! - `CONTACTS_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::endpoints::{ApiFlavor, Endpoints};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SESSION_FILE: &str = ".contacts-session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub flavor: ApiFlavor,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            flavor: ApiFlavor::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let base_url = match get("CONTACTS_API_URL") {
            Some(raw) => {
                let parsed = url::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
                    key: "CONTACTS_API_URL",
                    reason: e.to_string(),
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid {
                        key: "CONTACTS_API_URL",
                        reason: format!("unsupported scheme '{}'", parsed.scheme()),
                    });
                }
                raw.trim().trim_end_matches('/').to_string()
            }
            None => defaults.base_url,
        };

        let flavor = match get("CONTACTS_API_FLAVOR") {
            Some(raw) => raw.parse::<ApiFlavor>().map_err(|reason| ConfigError::Invalid {
                key: "CONTACTS_API_FLAVOR",
                reason,
            })?,
            None => defaults.flavor,
        };

        let session_file = get("CONTACTS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let timeout = match get("CONTACTS_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CONTACTS_HTTP_TIMEOUT_SECS",
                        reason: format!("expected a positive integer, got '{raw}'"),
                    })
                }
            },
            None => defaults.timeout,
        };

        Ok(Self {
            base_url,
            flavor,
            session_file,
            timeout,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::for_flavor(self.flavor)
    }
}
