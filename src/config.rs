//! Top-level application configuration.
//!
//! Configuration is stored in `config.yaml` under the reelsync root and includes:
//! - Data service URL and anon key
//! - Catalog API key and base URL
//! - Search debounce and trending list size
//! - Remote operation timeout

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};
use crate::paths::config_path;

pub const DEFAULT_CATALOG_URL: &str = "https://api.themoviedb.org/3";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Structured-data service settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Movie catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Incremental search settings
    #[serde(default, skip_serializing_if = "SearchConfig::is_default")]
    pub search: SearchConfig,

    /// Remote operation timeout in seconds (default: 30)
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout: u64,
}

fn default_remote_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            catalog: CatalogConfig::default(),
            search: SearchConfig::default(),
            remote_timeout: default_remote_timeout(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: None,
        }
    }
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Incremental search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last edit before a search runs (default: 1000)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Number of rows in the trending list (default: 5)
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_trending_limit() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            trending_limit: default_trending_limit(),
        }
    }
}

impl SearchConfig {
    /// Check if this config has default values
    pub fn is_default(&self) -> bool {
        self.debounce_ms == default_debounce_ms()
            && self.trending_limit == default_trending_limit()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Read a non-empty environment variable
fn env_override(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ReelError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;

        // Owner read/write only, the file holds API keys
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Data service URL from environment or config file
    pub fn backend_url(&self) -> Result<String> {
        env_override("REELSYNC_BACKEND_URL")
            .or_else(|| self.backend.url.clone())
            .ok_or_else(|| {
                ReelError::Config(
                    "backend URL not configured. Set REELSYNC_BACKEND_URL or backend.url in config.yaml"
                        .to_string(),
                )
            })
    }

    /// Data service anon key from environment or config file
    pub fn backend_key(&self) -> Result<SecretString> {
        env_override("REELSYNC_BACKEND_KEY")
            .or_else(|| self.backend.anon_key.clone())
            .map(SecretString::from)
            .ok_or_else(|| {
                ReelError::Config(
                    "backend key not configured. Set REELSYNC_BACKEND_KEY or backend.anon_key in config.yaml"
                        .to_string(),
                )
            })
    }

    /// Catalog API key from environment or config file
    pub fn catalog_api_key(&self) -> Result<SecretString> {
        env_override("TMDB_API_KEY")
            .or_else(|| self.catalog.api_key.clone())
            .map(SecretString::from)
            .ok_or_else(|| {
                ReelError::Config(
                    "catalog API key not configured. Set TMDB_API_KEY or catalog.api_key in config.yaml"
                        .to_string(),
                )
            })
    }

    pub fn set_backend(&mut self, url: String, anon_key: String) {
        self.backend = BackendConfig {
            url: Some(url),
            anon_key: Some(anon_key),
        };
    }

    pub fn set_catalog_api_key(&mut self, api_key: String) {
        self.catalog.api_key = Some(api_key);
    }

    /// Get the remote operation timeout duration
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config: Config = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.remote_timeout, 30);
        assert_eq!(config.search.debounce_ms, 1000);
        assert_eq!(config.search.trending_limit, 5);
        assert_eq!(config.catalog.base_url, DEFAULT_CATALOG_URL);
        assert!(config.backend.url.is_none());
    }

    #[test]
    fn test_config_partial_search_section() {
        let yaml = r#"
search:
  debounce_ms: 250
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.search.debounce(), Duration::from_millis(250));
        assert_eq!(config.search.trending_limit, 5);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.set_backend("https://db.example".to_string(), "anon-secret".to_string());
        config.set_catalog_api_key("tmdb-secret".to_string());

        let debug = format!("{config:?}");
        assert!(debug.contains("https://db.example"));
        assert!(!debug.contains("anon-secret"));
        assert!(!debug.contains("tmdb-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.set_backend("https://db.example".to_string(), "anon".to_string());
        config.search.debounce_ms = 300;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend.url.as_deref(), Some("https://db.example"));
        assert_eq!(loaded.search.debounce_ms, 300);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.remote_timeout, 30);
        assert_eq!(config.remote_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_matches_empty_yaml() {
        let parsed: Config = serde_yaml_ng::from_str("{}").unwrap();
        let default = Config::default();
        assert_eq!(default.remote_timeout, parsed.remote_timeout);
        assert_eq!(default.search.debounce_ms, parsed.search.debounce_ms);
        assert_eq!(default.catalog.base_url, parsed.catalog.base_url);
    }

    #[test]
    fn test_saving_defaults_keeps_timeout() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        Config::default().save_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("remote_timeout: 30"));
        assert_eq!(Config::load_from(&path).unwrap().remote_timeout, 30);
    }

    #[test]
    #[serial]
    fn test_env_overrides_config_file() {
        let mut config = Config::default();
        config.set_catalog_api_key("from-file".to_string());

        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::set_var("TMDB_API_KEY", "from-env") };
        assert_eq!(config.catalog_api_key().unwrap().expose_secret(), "from-env");

        unsafe { std::env::remove_var("TMDB_API_KEY") };
        assert_eq!(
            config.catalog_api_key().unwrap().expose_secret(),
            "from-file"
        );
    }

    #[test]
    #[serial]
    fn test_missing_backend_url_is_config_error() {
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::remove_var("REELSYNC_BACKEND_URL") };
        let config = Config::default();
        assert!(matches!(config.backend_url(), Err(ReelError::Config(_))));
    }
}
