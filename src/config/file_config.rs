//! Plain TOML configuration files.
//!
//! Used by `pubmed-search config init` to write a starter file. The file
//! layout is:
//!
//! ```toml
//! [eutils]
//! api_key = "your-ncbi-key"
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//! timeout_secs = 30
//! tool = "pubmed-search"
//! email = "you@example.org"
//!
//! [rate_limits]
//! with_api_key_ms = 100
//! without_api_key_ms = 340
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{0} already exists")]
    Exists(String),
}

/// Read a TOML file without environment overrides
pub fn read_config_file(path: &Path) -> Result<Config, ConfigFileError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
}

/// Write `config` to `path`, refusing to replace an existing file unless `force`
pub fn write_config_file(
    config: &Config,
    path: &Path,
    force: bool,
) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }

    let content = config
        .to_toml()
        .map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.eutils.api_key = Some("saved-key".to_string());
        config.eutils.tool = Some("pubmed-search".to_string());
        config.rate_limits.without_api_key_ms = 400;

        write_config_file(&config, &path, false).unwrap();

        let loaded = read_config_file(&path).unwrap();
        assert_eq!(loaded.eutils.api_key.as_deref(), Some("saved-key"));
        assert_eq!(loaded.eutils.tool.as_deref(), Some("pubmed-search"));
        assert_eq!(loaded.rate_limits.without_api_key_ms, 400);
    }

    #[test]
    fn test_existing_file_needs_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::default();
        assert!(matches!(
            write_config_file(&config, &path, false),
            Err(ConfigFileError::Exists(_))
        ));
        assert!(write_config_file(&config, &path, true).is_ok());
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(matches!(
            read_config_file(&path),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
