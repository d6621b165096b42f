use std::collections::HashMap;

use phonebook_core::error::{DirectoryError, Result};
use phonebook_core::ids::ProfileId;
use phonebook_core::profile::{Profile, ProfileRepository};

use super::DirectoryStore;

fn ensure_username_free(profiles: &HashMap<ProfileId, Profile>, profile: &Profile) -> Result<()> {
    if profiles
        .values()
        .any(|other| other.id != profile.id && other.username == profile.username)
    {
        return Err(DirectoryError::conflict("profile", profile.username.clone()));
    }
    Ok(())
}

impl ProfileRepository for DirectoryStore {
    fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Profile>> {
        Ok(self
            .read()?
            .profiles
            .values()
            .find(|profile| profile.username == username)
            .cloned())
    }

    fn find_many(&self, ids: &[ProfileId]) -> Result<Vec<Profile>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }

    fn save(&self, profile: &Profile) -> Result<()> {
        let mut state = self.write()?;
        ensure_username_free(&state.profiles, profile)?;
        state.profiles.insert(profile.id, profile.clone());
        tracing::debug!("Saved profile {} ({})", profile.id, profile.username);
        Ok(())
    }

    fn update(
        &self,
        id: ProfileId,
        apply: &mut dyn FnMut(&mut Profile) -> Result<()>,
    ) -> Result<Profile> {
        let mut state = self.write()?;
        let mut profile = state
            .profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found("profile", id.to_string()))?;
        apply(&mut profile)?;
        ensure_username_free(&state.profiles, &profile)?;
        state.profiles.insert(id, profile.clone());
        tracing::debug!("Updated profile {} ({})", profile.id, profile.username);
        Ok(profile)
    }

    fn delete(&self, id: ProfileId) -> Result<bool> {
        Ok(self.write()?.profiles.remove(&id).is_some())
    }
}
