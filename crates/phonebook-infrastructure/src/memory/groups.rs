use std::collections::HashMap;

use phonebook_core::error::{DirectoryError, Result};
use phonebook_core::group::{Group, GroupRepository};
use phonebook_core::ids::{GroupId, ProfileId};

use super::DirectoryStore;

/// Whether another group already answers to `group`'s name or aliases.
fn name_taken(groups: &HashMap<GroupId, Group>, group: &Group) -> bool {
    groups.values().filter(|other| other.id != group.id).any(|other| {
        other.answers_to(&group.name) || group.aliases.iter().any(|alias| other.answers_to(alias))
    })
}

impl GroupRepository for DirectoryStore {
    fn find_by_id(&self, id: GroupId) -> Result<Option<Group>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        Ok(self
            .read()?
            .groups
            .values()
            .find(|group| group.answers_to(name))
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self.read()?.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    fn find_for_profile(&self, profile: ProfileId) -> Result<Vec<Group>> {
        Ok(self
            .read()?
            .groups
            .values()
            .filter(|group| group.membership(profile).is_some() || group.is_curator(profile))
            .cloned()
            .collect())
    }

    fn insert(&self, group: &Group) -> Result<()> {
        let mut state = self.write()?;
        if state.groups.contains_key(&group.id) || name_taken(&state.groups, group) {
            return Err(DirectoryError::conflict("group", group.name.clone()));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    fn save(&self, group: &Group) -> Result<Group> {
        let mut state = self.write()?;
        let stored_version = state
            .groups
            .get(&group.id)
            .map(|stored| stored.version)
            .ok_or_else(|| DirectoryError::not_found("group", group.id.to_string()))?;
        if stored_version != group.version {
            return Err(DirectoryError::conflict("group", group.id.to_string()));
        }
        if name_taken(&state.groups, group) {
            return Err(DirectoryError::conflict("group", group.name.clone()));
        }

        let mut saved = group.clone();
        saved.version += 1;
        state.groups.insert(saved.id, saved.clone());
        tracing::debug!("Saved group {} at version {}", saved.name, saved.version);
        Ok(saved)
    }

    fn delete(&self, id: GroupId) -> Result<bool> {
        Ok(self.write()?.groups.remove(&id).is_some())
    }
}
