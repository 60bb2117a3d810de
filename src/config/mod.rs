//! Configuration management.
//!
//! Settings are read from an optional TOML file and overridden by environment
//! variables prefixed with `PUBMED_SEARCH_`, using `__` between nested keys
//! (for example `PUBMED_SEARCH_EUTILS__TIMEOUT_SECS=60`).

mod file_config;

pub use config::ConfigError;
pub use file_config::{read_config_file, write_config_file, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "pubmed-search.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// E-utilities connection settings
    #[serde(default)]
    pub eutils: EutilsConfig,

    /// Request spacing
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// E-utilities connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EutilsConfig {
    /// NCBI API key (optional, raises the request ceiling)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Tool name reported to NCBI
    #[serde(default)]
    pub tool: Option<String>,

    /// Contact address reported to NCBI
    #[serde(default)]
    pub email: Option<String>,

    /// User-Agent header; defaults to `pubmed-search/<version>`
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            tool: None,
            email: None,
            user_agent: None,
        }
    }
}

impl EutilsConfig {
    /// Configured API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok()
}

fn default_base_url() -> String {
    crate::pubmed::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Minimum spacing between requests, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_with_api_key_ms")]
    pub with_api_key_ms: u64,

    #[serde(default = "default_without_api_key_ms")]
    pub without_api_key_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            with_api_key_ms: default_with_api_key_ms(),
            without_api_key_ms: default_without_api_key_ms(),
        }
    }
}

impl RateLimitConfig {
    /// Effective spacing depending on whether an API key is configured
    pub fn spacing(&self, has_api_key: bool) -> Duration {
        Duration::from_millis(if has_api_key {
            self.with_api_key_ms
        } else {
            self.without_api_key_ms
        })
    }
}

fn default_with_api_key_ms() -> u64 {
    100
}

fn default_without_api_key_ms() -> u64 {
    340
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" or "pretty"
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    build(Some(path))
}

/// Load from `path`, else from the first file [`find_config_file`] finds,
/// else from defaults and the environment alone
pub fn get_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => match find_config_file() {
            Some(found) => {
                tracing::debug!(path = %found.display(), "Using config file");
                load_config(&found)
            }
            None => build(None),
        },
    }
}

fn build(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix("PUBMED_SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// `./pubmed-search.toml`, then `<config dir>/pubmed-search/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("pubmed-search").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.eutils.base_url,
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
        );
        assert_eq!(config.eutils.timeout(), Duration::from_secs(30));
        assert_eq!(config.rate_limits.spacing(true), Duration::from_millis(100));
        assert_eq!(config.rate_limits.spacing(false), Duration::from_millis(340));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let eutils = EutilsConfig {
            api_key: Some("  ".to_string()),
            ..EutilsConfig::default()
        };
        assert_eq!(eutils.api_key(), None);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pubmed-search.toml");
        std::fs::write(
            &path,
            r#"
[eutils]
api_key = "file-key"
base_url = "http://localhost:9999/eutils"
timeout_secs = 5
email = "me@example.org"

[rate_limits]
without_api_key_ms = 500

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.eutils.api_key(), Some("file-key"));
        assert_eq!(config.eutils.base_url, "http://localhost:9999/eutils");
        assert_eq!(config.eutils.timeout_secs, 5);
        assert_eq!(config.eutils.email.as_deref(), Some("me@example.org"));
        assert_eq!(config.rate_limits.without_api_key_ms, 500);
        assert_eq!(config.rate_limits.with_api_key_ms, 100);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_to_toml() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[rate_limits]"));
        assert!(rendered.contains("without_api_key_ms = 340"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.rate_limits, config.rate_limits);
    }
}
