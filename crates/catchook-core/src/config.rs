//! Application configuration management.
//!
//! Configuration holds the API base URL, the credential scheme the backend
//! speaks, and the last e-mail used to log in.
//!
//! Configuration is stored at `~/.config/catchook/config.json`. Environment
//! variables (`CATCHOOK_API_URL`, `CATCHOOK_AUTH_SCHEME`, `CATCHOOK_EMAIL`)
//! override the file.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "catchook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend address used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Which credential scheme the backend deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    /// Opaque session id, refreshed proactively before it expires
    #[default]
    Session,
    /// Access/refresh token pair, refreshed only after a 401
    Tokens,
}

impl FromStr for SchemeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "session" | "session-id" | "session_id" => Ok(SchemeKind::Session),
            "tokens" | "token" | "token-pair" | "jwt" => Ok(SchemeKind::Tokens),
            other => Err(anyhow::anyhow!("Unknown auth scheme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub scheme: SchemeKind,
    #[serde(default)]
    pub last_email: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            scheme: SchemeKind::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("CATCHOOK_API_URL").ok(),
            std::env::var("CATCHOOK_AUTH_SCHEME").ok(),
            std::env::var("CATCHOOK_EMAIL").ok(),
        );
    }

    fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        scheme: Option<String>,
        email: Option<String>,
    ) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = scheme {
            match raw.parse() {
                Ok(kind) => self.scheme = kind,
                Err(e) => warn!(error = %e, "Ignoring CATCHOOK_AUTH_SCHEME"),
            }
        }
        if let Some(email) = email.filter(|e| !e.is_empty()) {
            self.last_email = Some(email);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the cookie jar and log file
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_kind_from_str() {
        assert_eq!("session".parse::<SchemeKind>().unwrap(), SchemeKind::Session);
        assert_eq!("Tokens".parse::<SchemeKind>().unwrap(), SchemeKind::Tokens);
        assert_eq!(" jwt ".parse::<SchemeKind>().unwrap(), SchemeKind::Tokens);
        assert!("cookies".parse::<SchemeKind>().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.scheme, SchemeKind::Session);
        assert!(config.last_email.is_none());

        let config: Config = serde_json::from_str(r#"{"scheme":"tokens"}"#).unwrap();
        assert_eq!(config.scheme, SchemeKind::Tokens);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(
            Some("https://api.example.com/api/v1/".to_string()),
            Some("tokens".to_string()),
            Some("admin@example.com".to_string()),
        );
        assert_eq!(config.api_base_url, "https://api.example.com/api/v1");
        assert_eq!(config.scheme, SchemeKind::Tokens);
        assert_eq!(config.last_email.as_deref(), Some("admin@example.com"));

        // Bad scheme and empty values leave the config alone
        config.apply_overrides(Some("  ".to_string()), Some("nope".to_string()), Some(String::new()));
        assert_eq!(config.api_base_url, "https://api.example.com/api/v1");
        assert_eq!(config.scheme, SchemeKind::Tokens);
        assert_eq!(config.last_email.as_deref(), Some("admin@example.com"));
    }
}
