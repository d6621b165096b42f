//! Directory
//!
//! Wires the profile, vouch and group services over one shared store and
//! handles loading and persisting that store.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use phonebook_core::DirectoryConfig;
use phonebook_core::profile::Profile;
use phonebook_infrastructure::{ConfigService, DirectoryStore, PhonebookPaths};

use crate::group_service::GroupService;
use crate::profile_service::ProfileService;
use crate::vouch_service::VouchService;

/// Entry point bundling every directory service
pub struct Directory {
    store: DirectoryStore,
    profiles: ProfileService,
    vouches: VouchService,
    groups: GroupService,
}

impl Directory {
    /// Create a Directory over an existing store
    pub fn new(store: DirectoryStore, config: DirectoryConfig) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            profiles: ProfileService::new(shared.clone(), config.clone()),
            vouches: VouchService::new(shared.clone(), shared.clone(), shared.clone(), config.clone()),
            groups: GroupService::new(shared.clone(), shared, config),
            store,
        }
    }

    /// An empty directory with default configuration.
    pub fn in_memory() -> Self {
        Self::new(DirectoryStore::new(), DirectoryConfig::default())
    }

    /// Loads configuration through `config_service` and restores the store
    /// from `snapshot` (an absent file yields an empty directory).
    pub fn open(config_service: &ConfigService, snapshot: &Path) -> Result<Self> {
        let config = config_service
            .get_config()
            .context("Failed to load directory configuration")?;
        let store = DirectoryStore::load_from(snapshot)
            .with_context(|| format!("Failed to load snapshot from {}", snapshot.display()))?;
        tracing::info!("Opened directory from {}", snapshot.display());
        Ok(Self::new(store, config))
    }

    /// Opens the directory from the platform configuration and data paths.
    pub fn open_default() -> Result<Self> {
        let snapshot = PhonebookPaths::snapshot_file().context("Failed to resolve snapshot path")?;
        Self::open(&ConfigService::new(), &snapshot)
    }

    /// Writes the current contents to `path`.
    pub fn persist(&self, path: &Path) -> Result<()> {
        self.store
            .save_to(path)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn vouches(&self) -> &VouchService {
        &self.vouches
    }

    pub fn groups(&self) -> &GroupService {
        &self.groups
    }

    pub fn config(&self) -> &DirectoryConfig {
        self.profiles.config()
    }

    /// Registers a profile and issues its automatic vouch when the login
    /// email qualifies.
    pub fn register(&self, profile: Profile) -> phonebook_core::Result<Profile> {
        let profile = self.profiles.register(profile)?;
        if let Some(vouch) = self.vouches.auto_vouch(profile.id)? {
            tracing::info!("Auto-vouched {} on registration ({})", profile.username, vouch.id);
        }
        self.profiles.get(profile.id)
    }
}
