//! Path management for phonebook configuration and data files.

use std::path::PathBuf;

use phonebook_core::error::{DirectoryError, Result};

const APP_DIR: &str = "phonebook";

/// Resolves platform directories for phonebook.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/phonebook/         # Config directory
/// └── config.toml              # Engine configuration
///
/// ~/.local/share/phonebook/    # Data directory
/// └── snapshot.json            # Directory snapshot
/// ```
pub struct PhonebookPaths;

impl PhonebookPaths {
    /// Returns the phonebook configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/phonebook/`)
    /// - `Err(DirectoryError::Config)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DirectoryError::config("Cannot find config directory"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DirectoryError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn snapshot_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("snapshot.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file() {
        let Ok(config_file) = PhonebookPaths::config_file() else {
            return;
        };
        assert!(config_file.ends_with("phonebook/config.toml"));
        assert!(config_file.starts_with(PhonebookPaths::config_dir().unwrap()));
    }

    #[test]
    fn test_snapshot_file() {
        let Ok(snapshot) = PhonebookPaths::snapshot_file() else {
            return;
        };
        assert!(snapshot.ends_with("snapshot.json"));
    }
}
