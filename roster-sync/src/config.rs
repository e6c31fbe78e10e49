//! File-backed configuration. Secrets never live here; see
//! [`crate::auth::Credentials::from_env`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, DEFAULT_TOKEN_URL};
use crate::error::{Error, Result};
use crate::storage::{DEFAULT_API_BASE, DEFAULT_CONTENT_BASE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Public read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Shared link to the CSV; `dl=1` is forced on fetch.
    #[serde(default)]
    pub shared_csv_url: Option<String>,

    /// Seconds a fetched roster is served from cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { shared_csv_url: None, cache_ttl_secs: default_cache_ttl_secs() }
    }
}

/// Authenticated write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Absolute path of the CSV inside the app folder.
    #[serde(default)]
    pub write_path: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_content_base")]
    pub content_base: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            write_path: None,
            api_base: default_api_base(),
            content_base: default_content_base(),
            token_url: default_token_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Minimum gap between two write attempts, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Initial state of the autosave toggle.
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), autosave: true }
    }
}

fn default_cache_ttl_secs() -> u64 { 10 }
fn default_debounce_ms() -> u64 { 350 }
fn default_true() -> bool { true }
fn default_api_base() -> String { DEFAULT_API_BASE.to_string() }
fn default_content_base() -> String { DEFAULT_CONTENT_BASE.to_string() }
fn default_token_url() -> String { DEFAULT_TOKEN_URL.to_string() }

impl SyncConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.source.cache_ttl_secs)
    }

    pub fn shared_csv_url(&self) -> Option<&str> {
        non_blank(self.source.shared_csv_url.as_deref())
    }

    pub fn write_path(&self) -> Option<&str> {
        non_blank(self.storage.write_path.as_deref())
    }

    /// The read URL is required to start at all. A missing write path only
    /// disables persistence and is reported per write.
    pub fn validate(&self) -> Result<()> {
        if self.shared_csv_url().is_none() {
            return Err(Error::Config("shared CSV URL is not set (STATE_SHARED_CSV_URL)".into()));
        }
        if let Some(path) = self.write_path() {
            if !path.starts_with('/') {
                return Err(Error::Config(format!("write path must be absolute, got {path:?}")));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What the status panel shows about the connection setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub token: std::result::Result<(), String>,
    pub csv_link_configured: bool,
    pub write_path: Option<String>,
}

impl Diagnostics {
    pub fn collect(config: &SyncConfig, credentials: &Credentials, token_error: Option<String>) -> Self {
        let token = match token_error {
            Some(e) => Err(e),
            None if credentials.is_configured() => Ok(()),
            None => Err("no credentials configured".to_string()),
        };
        Self {
            token,
            csv_link_configured: config.shared_csv_url().is_some(),
            write_path: config.write_path().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessToken;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(350));
        assert_eq!(config.cache_ttl(), Duration::from_secs(10));
        assert!(config.sync.autosave);
        assert_eq!(config.storage.token_url, "https://api.dropbox.com/oauth2/token");
    }

    #[test]
    fn test_partial_sections() {
        let config = SyncConfig::from_toml_str(
            r#"
[source]
shared_csv_url = "https://www.dropbox.com/scl/fi/x/state.csv?dl=0"

[storage]
write_path = "/career-fair/state.csv"

[sync]
debounce_ms = 500
autosave = false
"#,
        )
        .unwrap();
        assert_eq!(config.source.cache_ttl_secs, 10);
        assert_eq!(config.write_path(), Some("/career-fair/state.csv"));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(!config.sync.autosave);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_url_and_relative_path() {
        assert!(matches!(SyncConfig::default().validate(), Err(Error::Config(_))));

        let mut config = SyncConfig::default();
        config.source.shared_csv_url = Some("https://host/f.csv".into());
        config.storage.write_path = Some("state.csv".into());
        assert!(config.validate().is_err());

        config.storage.write_path = Some("   ".into());
        assert!(config.validate().is_ok());
        assert_eq!(config.write_path(), None);
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        assert!(matches!(SyncConfig::from_toml_str("[sync]\ndebounce_ms = \"fast\""), Err(Error::Config(_))));
    }

    #[test]
    fn test_diagnostics() {
        let mut config = SyncConfig::default();
        config.storage.write_path = Some("/fair/state.csv".into());
        let creds = Credentials { access_token: Some(AccessToken::new("t")), refresh: None };

        let ok = Diagnostics::collect(&config, &creds, None);
        assert_eq!(ok.token, Ok(()));
        assert!(!ok.csv_link_configured);
        assert_eq!(ok.write_path.as_deref(), Some("/fair/state.csv"));

        let failed = Diagnostics::collect(&config, &creds, Some("status 400".into()));
        assert_eq!(failed.token, Err("status 400".into()));

        let missing = Diagnostics::collect(&config, &Credentials::default(), None);
        assert!(missing.token.is_err());
    }
}
