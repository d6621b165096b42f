//! Profile Service
//!
//! Registration, privacy settings and identity management for profiles,
//! plus the per-request viewing context every redacted read starts from.

use std::sync::Arc;

use phonebook_core::error::{DirectoryError, Rejection, Result};
use phonebook_core::privacy::{FieldValue, PrivacyLevel, ProfileField, Viewer, ViewingContext};
use phonebook_core::profile::{IdentityLink, Profile, ProfileRepository};
use phonebook_core::{DirectoryConfig, IdentityId, ProfileId};

/// Service for reading and updating profiles
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    config: DirectoryConfig,
}

impl ProfileService {
    /// Create a new ProfileService
    pub fn new(profiles: Arc<dyn ProfileRepository>, config: DirectoryConfig) -> Self {
        Self { profiles, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Loads a profile or fails with `NotFound`.
    pub fn get(&self, id: ProfileId) -> Result<Profile> {
        self.profiles
            .find_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("profile", id.to_string()))
    }

    /// Stores a new profile.
    ///
    /// Vouch status is derived from the vouch graph, so `is_vouched` and
    /// `can_vouch` always start cleared.
    ///
    /// # Returns
    ///
    /// - `Ok(Profile)`: The stored profile
    /// - `Err(DirectoryError::Validation)`: The username is blacklisted or
    ///   taken (field `username`)
    pub fn register(&self, mut profile: Profile) -> Result<Profile> {
        if self.config.is_username_blacklisted(&profile.username) {
            tracing::info!("Refused blacklisted username {}", profile.username);
            return Err(DirectoryError::validation("username", Rejection::UsernameBlacklisted));
        }
        if self.profiles.find_by_username(&profile.username)?.is_some() {
            return Err(DirectoryError::validation("username", Rejection::NameTaken));
        }
        profile.is_vouched = false;
        profile.can_vouch = false;
        match self.profiles.save(&profile) {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                return Err(DirectoryError::validation("username", Rejection::NameTaken));
            }
            Err(e) => return Err(e),
        }
        tracing::info!("Registered profile {} ({})", profile.id, profile.username);
        Ok(profile)
    }

    /// Runs `apply` on the stored profile as one repository step and touches
    /// it. Returns the outcome of `apply` with the stored profile.
    fn update<T>(
        &self,
        id: ProfileId,
        apply: impl FnOnce(&mut Profile) -> Result<T>,
    ) -> Result<(T, Profile)> {
        let mut apply = Some(apply);
        let mut outcome = None;
        let profile = self.profiles.update(id, &mut |profile: &mut Profile| {
            let apply = apply
                .take()
                .ok_or_else(|| DirectoryError::internal("profile edit applied twice"))?;
            outcome = Some(apply(profile)?);
            profile.touch();
            Ok(())
        })?;
        let outcome =
            outcome.ok_or_else(|| DirectoryError::internal("profile edit was not applied"))?;
        Ok((outcome, profile))
    }

    /// Builds the viewing context for a request made by `viewer`.
    ///
    /// Anonymous requests and viewers whose profile no longer exists are
    /// cleared at `Public`.
    pub fn viewing_context(&self, viewer: Option<ProfileId>) -> Result<ViewingContext> {
        let viewer = match viewer {
            Some(id) => self.profiles.find_by_id(id)?.map(|p| Viewer::from_profile(&p)),
            None => None,
        };
        Ok(ViewingContext::for_viewer(viewer.as_ref(), &self.config))
    }

    /// Reads one controlled field of `target` as `viewer` sees it.
    pub fn read_field(
        &self,
        target: ProfileId,
        field: ProfileField,
        viewer: Option<ProfileId>,
    ) -> Result<FieldValue> {
        let context = self.viewing_context(viewer)?;
        let profile = self.get(target)?;
        Ok(profile.view(context).read(field))
    }

    /// The effective email of `target` as `viewer` sees it.
    pub fn email_for(&self, target: ProfileId, viewer: Option<ProfileId>) -> Result<String> {
        let context = self.viewing_context(viewer)?;
        let profile = self.get(target)?;
        Ok(profile.view(context).email())
    }

    /// Changes the visibility threshold of one field.
    ///
    /// # Returns
    ///
    /// - `Err(DirectoryError::Validation)`: `Private` was requested for a field
    ///   that does not accept it (field `privacy_<name>`)
    pub fn set_field_privacy(
        &self,
        id: ProfileId,
        field: ProfileField,
        level: PrivacyLevel,
    ) -> Result<Profile> {
        let ((), profile) = self.update(id, |profile| profile.set_threshold(field, level))?;
        tracing::debug!("Set privacy of {} on {} to {}", field, id, level);
        Ok(profile)
    }

    /// Applies `level` to every field at once.
    pub fn set_privacy_level(&self, id: ProfileId, level: PrivacyLevel) -> Result<Profile> {
        let ((), profile) = self.update(id, |profile| {
            profile.set_privacy_level(level);
            Ok(())
        })?;
        tracing::info!("Set every privacy threshold of {} to {}", id, level);
        Ok(profile)
    }

    pub fn attach_identity(&self, id: ProfileId, link: IdentityLink) -> Result<IdentityId> {
        let (identity, _) = self.update(id, |profile| profile.attach_identity(link))?;
        tracing::info!("Attached identity {} to profile {}", identity, id);
        Ok(identity)
    }

    pub fn set_primary_contact(&self, id: ProfileId, identity: IdentityId) -> Result<Profile> {
        let ((), profile) = self.update(id, |profile| profile.set_primary_contact(identity))?;
        tracing::info!("Identity {} is now the contact identity of {}", identity, id);
        Ok(profile)
    }

    pub fn detach_identity(&self, id: ProfileId, identity: IdentityId) -> Result<IdentityLink> {
        let (link, _) = self.update(id, |profile| profile.detach_identity(identity))?;
        tracing::info!("Detached identity {} from profile {}", identity, id);
        Ok(link)
    }
}
