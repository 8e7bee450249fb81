// TOML config adapter - Configuration files in TOML

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::DistillConfig;
use crate::domain::errors::*;
use crate::ports::ConfigPort;

/// Locations searched when no file is given explicitly
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["distill.toml", "config/distill.toml"];

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    search_paths: Vec<PathBuf>,
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter searching the default locations
    pub fn new() -> Self {
        Self {
            search_paths: DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Search these locations instead of the defaults
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Parse a configuration document; missing keys take their defaults
    pub fn parse(content: &str) -> Result<DistillConfig, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::ConfigFail(format!("Failed to parse TOML config: {}", e)))
    }
}

impl ConfigPort for TomlConfigAdapter {
    fn locate(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>, DomainError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DomainError::ConfigFail(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let found = self.search_paths.iter().find(|p| p.is_file()).cloned();
        match &found {
            Some(path) => debug!(path = %path.display(), "Found config file"),
            None => debug!("No config file found, using defaults"),
        }
        Ok(found)
    }

    fn load(&self, path: &Path) -> Result<DistillConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::FsFail(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_fills_missing_keys_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("distill.toml");
        std::fs::write(
            &path,
            "[detection]\nframe_skip = 5\n\n[selection]\nsummary_fraction = 0.25\n",
        )
        .unwrap();

        let loaded = TomlConfigAdapter::new().load(&path).unwrap();
        assert_eq!(loaded.detection.frame_skip, 5);
        assert_eq!(loaded.selection.summary_fraction, 0.25);
        assert_eq!(loaded.selection.min_scenes, DistillConfig::default().selection.min_scenes);
    }

    #[test]
    fn test_load_missing_file_is_fs_failure() {
        let dir = TempDir::new().unwrap();
        let result = TomlConfigAdapter::new().load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(DomainError::FsFail(_))));
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        let result = TomlConfigAdapter::parse("[detection]\nframe_skip = \"many\"\n");
        assert!(matches!(result, Err(DomainError::ConfigFail(_))));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "").unwrap();

        let adapter = TomlConfigAdapter::with_search_paths(vec![dir.path().join("other.toml")]);
        assert_eq!(adapter.locate(Some(&explicit)).unwrap(), Some(explicit));
    }

    #[test]
    fn test_locate_missing_explicit_path_fails() {
        let adapter = TomlConfigAdapter::new();
        let result = adapter.locate(Some(Path::new("/nonexistent/distill.toml")));
        assert!(matches!(result, Err(DomainError::ConfigFail(_))));
    }

    #[test]
    fn test_locate_searches_in_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("distill.toml");
        let second = dir.path().join("config").join("distill.toml");
        std::fs::create_dir_all(second.parent().unwrap()).unwrap();
        std::fs::write(&second, "").unwrap();

        let adapter = TomlConfigAdapter::with_search_paths(vec![first.clone(), second.clone()]);
        assert_eq!(adapter.locate(None).unwrap(), Some(second));

        std::fs::write(&first, "").unwrap();
        assert_eq!(adapter.locate(None).unwrap(), Some(first));

        let empty = TomlConfigAdapter::with_search_paths(vec![dir.path().join("none.toml")]);
        assert_eq!(empty.locate(None).unwrap(), None);
    }
}
