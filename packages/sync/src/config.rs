use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "glyphhub.config.json";
pub const DEFAULT_CACHE_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandlerConfig {
    /// Apply edits locally but never write them back.
    pub read_only: bool,

    /// Number of fragments kept in the local cache.
    pub cache_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl HandlerConfig {
    /// Load `glyphhub.config.json` from `dir`, falling back to defaults when
    /// the file does not exist.
    pub fn load<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HandlerConfig::load(dir.path()).unwrap();
        assert_eq!(config, HandlerConfig::default());
        assert_eq!(config.cache_size, 128);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{"readOnly": true}"#).unwrap();
        let config = HandlerConfig::load(dir.path()).unwrap();
        assert!(config.read_only);
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{readOnly").unwrap();
        assert!(HandlerConfig::load(dir.path()).is_err());
    }
}
