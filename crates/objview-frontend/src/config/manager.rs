//! Loads, saves and shares the application configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::AppConfig;

pub type SharedConfig = Arc<RwLock<ConfigManager>>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Owns the configuration and its file location
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
    dirty: bool,
}

impl ConfigManager {
    /// Loads the configuration from the OS config directory, or falls back to defaults
    pub fn new() -> Self {
        Self::with_path(Self::config_dir().join("config.ron"))
    }

    /// Loads from an explicit file path. A missing file starts dirty so the
    /// defaults get written on the first save; an unreadable one is left alone.
    pub fn with_path(config_path: PathBuf) -> Self {
        let (config, dirty) = match Self::load_from_path(&config_path) {
            Some(config) => (config, false),
            None => {
                tracing::info!("No usable config file, using defaults");
                (AppConfig::new(), !config_path.exists())
            }
        };

        Self {
            config,
            config_path,
            dirty,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("objview")
    }

    #[cfg(target_arch = "wasm32")]
    fn config_dir() -> PathBuf {
        PathBuf::from(".")
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_from_path(path: &Path) -> Option<AppConfig> {
        let content = std::fs::read_to_string(path).ok()?;
        match ron::from_str(&content) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn load_from_path(_path: &Path) -> Option<AppConfig> {
        None
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Mutable access marks the configuration dirty
    pub fn config_mut(&mut self) -> &mut AppConfig {
        self.dirty = true;
        &mut self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the configuration if it changed since the last save
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = ron::ser::to_string_pretty(&self.config, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(&self.config_path, &content).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved config to {:?}", self.config_path);
        self.dirty = false;
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.dirty = false;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        self.config = AppConfig::new();
        self.dirty = true;
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_shared_config() -> SharedConfig {
    Arc::new(RwLock::new(ConfigManager::new()))
}
