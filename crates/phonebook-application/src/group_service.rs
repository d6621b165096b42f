//! Group Service
//!
//! Loads groups and the acting profile, applies a membership transition or a
//! section edit, and writes the group back with an optimistic version check.
//!
//! # Write conflicts
//!
//! A stale write is retried against a fresh copy of the group. A write that
//! collides on the group name surfaces as a `name` validation error; a write
//! that keeps losing races surfaces as `ConcurrentModification`.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use phonebook_core::error::{DirectoryError, Rejection, Result};
use phonebook_core::group::{
    AcceptancePolicy, Actor, AdminSettings, BasicInfo, Group, GroupRepository, Membership,
    MembershipChange, NewGroup, can_provision_access_group, validate_new_group,
};
use phonebook_core::privacy::{Viewer, ViewingContext};
use phonebook_core::profile::{Profile, ProfileRepository};
use phonebook_core::{DirectoryConfig, GroupId, ProfileId};

/// Attempts made at an optimistic group write before giving up.
const WRITE_ATTEMPTS: usize = 3;

/// Service for group membership and curation
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    profiles: Arc<dyn ProfileRepository>,
    config: DirectoryConfig,
}

impl GroupService {
    /// Create a new GroupService
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        profiles: Arc<dyn ProfileRepository>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            groups,
            profiles,
            config,
        }
    }

    fn load_profile(&self, id: ProfileId) -> Result<Profile> {
        self.profiles
            .find_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("profile", id.to_string()))
    }

    fn actor(&self, id: ProfileId) -> Result<Actor> {
        self.load_profile(id).map(|profile| Actor::from(&profile))
    }

    fn optional_actor(&self, id: Option<ProfileId>) -> Result<Option<Actor>> {
        id.map(|id| self.actor(id)).transpose()
    }

    /// Loads a group or fails with `NotFound`.
    pub fn get(&self, id: GroupId) -> Result<Group> {
        self.groups
            .find_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("group", id.to_string()))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.groups.find_by_name(name)
    }

    /// Fails with `NameTaken` on field `name` when a group other than
    /// `except` answers to `name`.
    fn ensure_name_available(&self, name: &str, except: Option<GroupId>) -> Result<()> {
        match self.groups.find_by_name(name)? {
            Some(existing) if Some(existing.id) != except => {
                Err(DirectoryError::validation("name", Rejection::NameTaken))
            }
            _ => Ok(()),
        }
    }

    /// Applies `apply` to a fresh copy of the group and saves it.
    fn update<T>(
        &self,
        id: GroupId,
        mut apply: impl FnMut(&mut Group) -> Result<T>,
    ) -> Result<(T, Group)> {
        for attempt in 1..=WRITE_ATTEMPTS {
            let mut group = self.get(id)?;
            let outcome = apply(&mut group)?;
            match self.groups.save(&group) {
                Ok(saved) => return Ok((outcome, saved)),
                Err(e) if e.is_conflict() => {
                    self.ensure_name_available(&group.name, Some(group.id))?;
                    tracing::debug!(
                        "Stale write to group {} (attempt {}/{})",
                        id,
                        attempt,
                        WRITE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }
        tracing::warn!("Giving up on group {} after {} stale writes", id, WRITE_ATTEMPTS);
        Err(DirectoryError::non_field(Rejection::ConcurrentModification))
    }

    /// Runs a membership transition and logs any resulting change.
    fn transition(
        &self,
        id: GroupId,
        profile: ProfileId,
        apply: impl FnMut(&mut Group) -> Result<MembershipChange>,
    ) -> Result<MembershipChange> {
        let (change, group) = self.update(id, apply)?;
        match change {
            MembershipChange::Entered(status) => {
                tracing::info!("{} is now {:?} in group '{}'", profile, status, group.name);
            }
            MembershipChange::Removed => {
                tracing::info!("{} removed from group '{}'", profile, group.name);
            }
            MembershipChange::NoChange => {}
        }
        Ok(change)
    }

    // ============================================================================
    // Creation
    // ============================================================================

    pub fn can_provision_access_group(&self, actor: Option<ProfileId>) -> Result<bool> {
        let actor = actor.map(|id| self.load_profile(id)).transpose()?;
        Ok(can_provision_access_group(actor.as_ref()))
    }

    /// Creates a group with `actor` as its first curator and member.
    ///
    /// # Returns
    ///
    /// - `Ok(Group)`: The stored group
    /// - `Err(DirectoryError::Validation)`: A required field is missing, the
    ///   name is taken, or the access-group rules refuse the request
    /// - `Err(DirectoryError::PermissionDenied)`: No actor was given
    pub fn create_group(&self, actor: Option<ProfileId>, request: NewGroup) -> Result<Group> {
        let creator = actor.map(|id| self.load_profile(id)).transpose()?;
        if let Err(e) = validate_new_group(creator.as_ref(), &request) {
            if e.rejection() == Some(Rejection::ProvisioningDenied) {
                tracing::warn!("Access group provisioning denied for {:?}", actor);
            }
            return Err(e);
        }
        let Some(creator) = creator else {
            return Err(DirectoryError::permission_denied(
                "anonymous users cannot create groups",
            ));
        };
        self.ensure_name_available(request.name.trim(), None)?;

        let group = request.into_group(&creator, Utc::now())?;
        match self.groups.insert(&group) {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                return Err(DirectoryError::validation("name", Rejection::NameTaken));
            }
            Err(e) => return Err(e),
        }
        tracing::info!(
            "Created {}group '{}' curated by {}",
            if group.is_access_group { "access " } else { "" },
            group.name,
            creator.id
        );
        Ok(group)
    }

    // ============================================================================
    // Membership transitions
    // ============================================================================

    pub fn invite(
        &self,
        actor: ProfileId,
        group: GroupId,
        invitee: ProfileId,
    ) -> Result<MembershipChange> {
        let actor = self.actor(actor)?;
        self.load_profile(invitee)?;
        self.transition(group, invitee, |g| g.invite(&actor, invitee, Utc::now()))
    }

    pub fn accept_invite(&self, profile: ProfileId, group: GroupId) -> Result<MembershipChange> {
        self.load_profile(profile)?;
        self.transition(group, profile, |g| g.accept_invite(profile, Utc::now()))
    }

    pub fn join(&self, profile: ProfileId, group: GroupId) -> Result<MembershipChange> {
        self.load_profile(profile)?;
        self.transition(group, profile, |g| g.join(profile, Utc::now()))
    }

    pub fn approve_request(
        &self,
        actor: ProfileId,
        group: GroupId,
        profile: ProfileId,
    ) -> Result<MembershipChange> {
        let actor = self.actor(actor)?;
        self.transition(group, profile, |g| g.approve_request(&actor, profile, Utc::now()))
    }

    pub fn add_member(
        &self,
        actor: ProfileId,
        group: GroupId,
        profile: ProfileId,
    ) -> Result<MembershipChange> {
        let actor = self.actor(actor)?;
        self.load_profile(profile)?;
        self.transition(group, profile, |g| g.add_member(&actor, profile, Utc::now()))
    }

    pub fn remove_member(
        &self,
        actor: ProfileId,
        group: GroupId,
        target: ProfileId,
    ) -> Result<MembershipChange> {
        let actor = self.actor(actor)?;
        self.transition(group, target, |g| g.remove_member(&actor, target))
    }

    pub fn leave(&self, profile: ProfileId, group: GroupId) -> Result<MembershipChange> {
        let actor = self.actor(profile)?;
        self.transition(group, profile, |g| g.leave(&actor))
    }

    /// Expires lapsed memberships in every group with an invalidation period.
    ///
    /// # Returns
    ///
    /// The profiles removed, per group
    pub fn expire_memberships(&self, now: DateTime<Utc>) -> Result<Vec<(GroupId, Vec<ProfileId>)>> {
        let mut expired = Vec::new();
        for group in self.groups.list_all()? {
            if group.invalidation_days.is_none() || group.clone().expire_memberships(now).is_empty() {
                continue;
            }
            let (removed, saved) = self.update(group.id, |g| Ok(g.expire_memberships(now)))?;
            if !removed.is_empty() {
                tracing::info!(
                    "Expired {} memberships in group '{}'",
                    removed.len(),
                    saved.name
                );
                expired.push((saved.id, removed));
            }
        }
        Ok(expired)
    }

    /// Membership entries of `group` as `viewer` may see them.
    pub fn member_listing(&self, group: GroupId, viewer: Option<ProfileId>) -> Result<Vec<Membership>> {
        let group = self.get(group)?;
        let viewer = match viewer {
            Some(id) => self.profiles.find_by_id(id)?,
            None => None,
        };
        let context = ViewingContext::for_viewer(
            viewer.as_ref().map(Viewer::from_profile).as_ref(),
            &self.config,
        );
        let actor = viewer.as_ref().map(Actor::from);
        Ok(group
            .member_listing(context, actor.as_ref())
            .into_iter()
            .cloned()
            .collect())
    }

    // ============================================================================
    // Section edits
    // ============================================================================

    pub fn edit_basic(&self, group: GroupId, info: BasicInfo) -> Result<Group> {
        self.ensure_name_available(info.name.trim(), Some(group))?;
        let ((), saved) = self.update(group, |g| g.edit_basic(info.clone()))?;
        tracing::info!("Updated basic information of group '{}'", saved.name);
        Ok(saved)
    }

    /// Replaces the curator list. Every curator must be an existing profile.
    pub fn edit_curators(
        &self,
        actor: Option<ProfileId>,
        group: GroupId,
        curators: BTreeSet<ProfileId>,
    ) -> Result<Group> {
        let actor = self.optional_actor(actor)?;
        let ids: Vec<ProfileId> = curators.iter().copied().collect();
        let found = self.profiles.find_many(&ids)?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|p| p.id == **id)) {
            return Err(DirectoryError::not_found("profile", missing.to_string()));
        }

        let now = Utc::now();
        let ((), saved) = self.update(group, |g| {
            g.edit_curators(actor.as_ref(), curators.clone(), now)
        })?;
        tracing::info!(
            "Group '{}' now has {} curators",
            saved.name,
            saved.curators.len()
        );
        Ok(saved)
    }

    pub fn edit_admin(
        &self,
        actor: Option<ProfileId>,
        group: GroupId,
        settings: AdminSettings,
    ) -> Result<Group> {
        let actor = self.optional_actor(actor)?;
        let ((), saved) = self.update(group, |g| g.edit_admin(actor.as_ref(), settings))?;
        tracing::info!("Updated admin settings of group '{}'", saved.name);
        Ok(saved)
    }

    pub fn edit_terms_expiration(
        &self,
        group: GroupId,
        terms: &str,
        invalidation_days: Option<u32>,
    ) -> Result<Group> {
        let max = self.config.max_invalidation_days;
        let ((), saved) = self.update(group, |g| {
            g.edit_terms_expiration(terms, invalidation_days, max)
        })?;
        tracing::info!(
            "Group '{}' memberships now lapse after {:?} days",
            saved.name,
            saved.invalidation_days
        );
        Ok(saved)
    }

    pub fn edit_criteria(
        &self,
        group: GroupId,
        accepting_new_members: AcceptancePolicy,
        new_member_criteria: &str,
    ) -> Result<Group> {
        let ((), saved) = self.update(group, |g| {
            g.edit_criteria(accepting_new_members, new_member_criteria)
        })?;
        tracing::info!(
            "Group '{}' now accepts new members: {}",
            saved.name,
            saved.accepting_new_members
        );
        Ok(saved)
    }

    pub fn edit_custom_invite_text(
        &self,
        actor: ProfileId,
        group: GroupId,
        text: &str,
    ) -> Result<Group> {
        let actor = self.actor(actor)?;
        let ((), saved) = self.update(group, |g| g.edit_custom_invite_text(&actor, text))?;
        tracing::debug!("Updated invitation text of group '{}'", saved.name);
        Ok(saved)
    }
}
