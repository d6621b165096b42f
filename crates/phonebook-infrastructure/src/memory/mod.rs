//! In-process directory storage.
//!
//! `DirectoryStore` keeps profiles, vouches and groups behind a single
//! `RwLock`, so every uniqueness check and the write that depends on it run
//! under one write guard. Handles are cheap to clone and share the same data.
//! The whole store can be written to and restored from a JSON snapshot.

mod groups;
mod profiles;
mod vouches;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use phonebook_core::error::{DirectoryError, Result};
use phonebook_core::group::Group;
use phonebook_core::ids::{GroupId, ProfileId, VouchId};
use phonebook_core::profile::Profile;
use phonebook_core::vouch::Vouch;

use crate::storage::write_atomic;

#[derive(Debug, Default)]
struct StoreState {
    profiles: HashMap<ProfileId, Profile>,
    vouches: BTreeMap<VouchId, Vouch>,
    groups: HashMap<GroupId, Group>,
}

/// Serializable copy of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub vouches: Vec<Vouch>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Shared in-memory implementation of every repository trait.
#[derive(Debug, Clone, Default)]
pub struct DirectoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| DirectoryError::internal("directory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| DirectoryError::internal("directory store lock poisoned"))
    }

    /// Copies the current contents, with vouches in date order.
    pub fn snapshot(&self) -> Result<DirectorySnapshot> {
        let state = self.read()?;
        let mut vouches: Vec<Vouch> = state.vouches.values().cloned().collect();
        vouches.sort_by_key(|vouch| vouch.date);
        Ok(DirectorySnapshot {
            profiles: state.profiles.values().cloned().collect(),
            vouches,
            groups: state.groups.values().cloned().collect(),
        })
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let state = StoreState {
            profiles: snapshot.profiles.into_iter().map(|p| (p.id, p)).collect(),
            vouches: snapshot.vouches.into_iter().map(|v| (v.id, v)).collect(),
            groups: snapshot.groups.into_iter().map(|g| (g.id, g)).collect(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Atomically writes the snapshot as pretty JSON, creating parent
    /// directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        write_atomic(path, serde_json::to_string_pretty(&snapshot)?.as_bytes())?;
        tracing::debug!(
            "Saved directory snapshot to {} ({} profiles, {} vouches, {} groups)",
            path.display(),
            snapshot.profiles.len(),
            snapshot.vouches.len(),
            snapshot.groups.len()
        );
        Ok(())
    }

    /// Restores a store from `path`; a missing file yields an empty store.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let snapshot: DirectorySnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonebook_core::group::AcceptancePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_survives_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("snapshot.json");

        let profile = Profile::new("jdoe", "jdoe@example.com");
        let vouch = Vouch::system(profile.id, "auto");
        let group = Group::new("rust", AcceptancePolicy::Open);
        let store = DirectoryStore::from_snapshot(DirectorySnapshot {
            profiles: vec![profile.clone()],
            vouches: vec![vouch.clone()],
            groups: vec![group.clone()],
        });
        store.save_to(&path).unwrap();

        let restored = DirectoryStore::load_from(&path).unwrap().snapshot().unwrap();
        assert_eq!(restored.profiles, vec![profile]);
        assert_eq!(restored.vouches, vec![vouch]);
        assert_eq!(restored.groups, vec![group]);
    }

    #[test]
    fn test_resave_replaces_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapshot.json");
        let first = Profile::new("first", "first@example.com");
        let second = Profile::new("second", "second@example.com");
        DirectoryStore::from_snapshot(DirectorySnapshot {
            profiles: vec![first, second.clone()],
            ..DirectorySnapshot::default()
        })
        .save_to(&path)
        .unwrap();

        DirectoryStore::from_snapshot(DirectorySnapshot {
            profiles: vec![second.clone()],
            ..DirectorySnapshot::default()
        })
        .save_to(&path)
        .unwrap();

        let restored = DirectoryStore::load_from(&path).unwrap().snapshot().unwrap();
        assert_eq!(restored.profiles, vec![second]);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirectoryStore::load_from(&temp_dir.path().join("none.json")).unwrap();
        assert_eq!(store.snapshot().unwrap(), DirectorySnapshot::default());
    }

    #[test]
    fn test_corrupt_snapshot_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapshot.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = DirectoryStore::load_from(&path).unwrap_err();
        assert!(matches!(err, DirectoryError::Serialization { .. }));
    }
}
