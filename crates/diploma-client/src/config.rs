//! # Client Configuration
//!
//! Backend location, session persistence, search behavior and the role
//! directory, loadable from the environment.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::domain::Role;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Default quiet period of the search input.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Upper bound for the search quiet period.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Diploma backend
    pub api: ApiConfig,
    /// Session persistence
    pub session: SessionConfig,
    /// History search input
    pub search: SearchConfig,
    /// Identity to role directory
    pub roles: RolesConfig,
}

/// Diploma backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Snapshot file; `None` keeps the snapshot in memory only
    pub storage_path: Option<PathBuf>,
    /// Re-resolve the persisted role against the directory on restore
    pub reverify_on_restore: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            reverify_on_restore: true,
        }
    }
}

/// History search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a search is dispatched
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub address: String,
    pub role: Role,
}

/// Identity to role directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    pub entries: Vec<RoleEntry>,
}

impl RolesConfig {
    /// Parse `address=role` pairs separated by commas.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        for pair in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (address, role) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidRoleEntry(pair.to_string()))?;
            let role = Role::parse(role)
                .filter(Role::is_privileged)
                .ok_or_else(|| ConfigError::InvalidRoleEntry(pair.to_string()))?;
            entries.push(RoleEntry {
                address: address.trim().to_string(),
                role,
            });
        }
        Ok(Self { entries })
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DIPLOMA_API_URL`: Backend base URL (default: http://localhost:3001/api)
    /// - `DIPLOMA_SESSION_FILE`: Session snapshot file (default: in memory)
    /// - `DIPLOMA_REVERIFY_ON_RESTORE`: Re-resolve role on restore (default: true)
    /// - `DIPLOMA_SEARCH_DEBOUNCE_MS`: Search quiet period (default: 300)
    /// - `DIPLOMA_ROLES`: Role directory as `addr=role,addr=role`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("DIPLOMA_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(path) = env::var("DIPLOMA_SESSION_FILE") {
            config.session.storage_path = Some(PathBuf::from(path));
        }
        if let Ok(value) = env::var("DIPLOMA_REVERIFY_ON_RESTORE") {
            config.session.reverify_on_restore = parse_flag(&value);
        }
        if let Ok(value) = env::var("DIPLOMA_SEARCH_DEBOUNCE_MS") {
            config.search.debounce_ms = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("DIPLOMA_SEARCH_DEBOUNCE_MS: {}", value))
            })?;
        }
        if let Ok(list) = env::var("DIPLOMA_ROLES") {
            config.roles = RolesConfig::parse(&list)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Config for tests, with the demo role directory.
    pub fn for_testing() -> Self {
        Self {
            roles: RolesConfig {
                entries: vec![
                    RoleEntry {
                        address: "0x1234567890123456789012345678901234567890".into(),
                        role: Role::Admin,
                    },
                    RoleEntry {
                        address: "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd".into(),
                        role: Role::Issuer,
                    },
                    RoleEntry {
                        address: "0x9876543210987654321098765432109876543210".into(),
                        role: Role::Verifier,
                    },
                ],
            },
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::InvalidApiUrl(format!("{}: {}", self.api.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl(self.api.base_url.clone()));
        }

        if self.search.debounce_ms == 0 || self.search.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "search debounce must be within 1..={} ms",
                MAX_DEBOUNCE_MS
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.roles.entries {
            if entry.address.trim().is_empty() || !entry.role.is_privileged() {
                return Err(ConfigError::InvalidRoleEntry(format!(
                    "{}={}",
                    entry.address, entry.role
                )));
            }
            if !seen.insert(entry.address.as_str()) {
                return Err(ConfigError::DuplicateRoleEntry(entry.address.clone()));
            }
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidApiUrl(String),

    #[error("invalid role entry: {0}")]
    InvalidRoleEntry(String),

    #[error("identity listed twice in role directory: {0}")]
    DuplicateRoleEntry(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:3001/api");
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert!(config.session.reverify_on_restore);
        assert!(config.session.storage_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = ClientConfig::for_testing();
        assert_eq!(config.roles.entries.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidApiUrl(_))
        ));

        config.api.base_url = "ftp://example.com/api".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_debounce() {
        let mut config = ClientConfig::default();
        config.search.debounce_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_roles() {
        let roles = RolesConfig::parse("0xaaa=admin, 0xbbb=verifier,").unwrap();
        assert_eq!(roles.entries.len(), 2);
        assert_eq!(roles.entries[1].address, "0xbbb");
        assert_eq!(roles.entries[1].role, Role::Verifier);

        assert!(RolesConfig::parse("0xaaa").is_err());
        assert!(RolesConfig::parse("0xaaa=root").is_err());
        assert!(RolesConfig::parse("0xaaa=").is_err());
    }

    #[test]
    fn test_rejects_duplicate_entries() {
        let mut config = ClientConfig::default();
        config.roles = RolesConfig::parse("0xaaa=admin,0xaaa=issuer").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateRoleEntry("0xaaa".into()))
        );
    }

    #[test]
    fn test_config_from_json() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "api": { "baseUrl": "ignored" },
            "roles": { "entries": [{ "address": "0xaaa", "role": "issuer" }] }
        }))
        .unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.roles.entries[0].role, Role::Issuer);
        assert_eq!(config.search.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }
}
