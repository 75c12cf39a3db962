use crate::error::{CompassError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: String,
    /// Name advertised to clients in the initialize handshake.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Fallback confidence threshold for directives that don't set one.
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,
}

fn default_server_name() -> String {
    "compass".to_string()
}

fn default_confidence() -> f64 {
    0.7
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            server_name: default_server_name(),
            default_confidence: default_confidence(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CompassError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = Config::new("my-project");
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "my-project");
        assert_eq!(loaded.server_name, "compass");
        assert_eq!(loaded.default_confidence, 0.7);
    }

    #[test]
    fn missing_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(CompassError::NotInitialized)
        ));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".compass")).unwrap();
        std::fs::write(dir.path().join(".compass/config.yaml"), "project: lean\n").unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "lean");
        assert_eq!(loaded.server_name, "compass");
    }
}
