//! Configuration service implementation.
//!
//! Loads the engine configuration from `config.toml` in the platform config
//! directory (`~/.config/phonebook/config.toml` on Linux) or from an
//! explicit path, and caches it.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use phonebook_core::config::DirectoryConfig;
use phonebook_core::error::{DirectoryError, Result};

use crate::paths::PhonebookPaths;
use crate::storage::write_atomic;

/// Loads and caches the directory configuration.
///
/// A missing file yields the defaults; a malformed or invalid file is an
/// error rather than a silent fallback.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    /// Explicit config file; `None` uses the platform location.
    path: Option<PathBuf>,
    /// Cached configuration, loaded lazily.
    config: Arc<RwLock<Option<DirectoryConfig>>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<DirectoryConfig> {
        {
            let cached = self
                .config
                .read()
                .map_err(|_| DirectoryError::internal("config cache lock poisoned"))?;
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load()?;
        let mut cached = self
            .config
            .write()
            .map_err(|_| DirectoryError::internal("config cache lock poisoned"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut cached) = self.config.write() {
            *cached = None;
        }
    }

    /// Validates and atomically writes `config`, then refreshes the cache.
    pub fn save(&self, config: &DirectoryConfig) -> Result<()> {
        config.validate()?;
        let path = self.config_path()?;
        write_atomic(&path, config.to_toml_string()?.as_bytes())?;
        tracing::info!("Saved configuration to {}", path.display());
        self.invalidate_cache();
        Ok(())
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => PhonebookPaths::config_file(),
        }
    }

    fn load(&self) -> Result<DirectoryConfig> {
        let path = self.config_path()?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(DirectoryConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = DirectoryConfig::from_toml_str(&content).map_err(|err| {
            tracing::warn!("Invalid config at {}: {}", path.display(), err);
            err
        })?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
