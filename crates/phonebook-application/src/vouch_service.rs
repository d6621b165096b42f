//! Vouch Service
//!
//! Creates and removes vouches, keeps the vouchee's derived flags in step
//! with the number of vouches received, and serves redacted vouch listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use phonebook_core::error::{DirectoryError, Rejection, Result};
use phonebook_core::group::GroupRepository;
use phonebook_core::privacy::ViewingContext;
use phonebook_core::profile::{Profile, ProfileRepository};
use phonebook_core::vouch::{
    Vouch, VouchRepository, apply_vouch_flags, check_vouchable, date_vouched, needs_auto_vouch,
    visible_made, visible_received, vouched_by,
};
use phonebook_core::{DirectoryConfig, GroupId, ProfileId, VouchId};

/// Attempts made at an optimistic group write before giving up.
const GROUP_WRITE_ATTEMPTS: usize = 3;

/// Recomputations of a profile's vouch flags while its count keeps moving.
const FLAG_REFRESH_ATTEMPTS: usize = 5;

/// Service for the vouch graph
pub struct VouchService {
    profiles: Arc<dyn ProfileRepository>,
    vouches: Arc<dyn VouchRepository>,
    groups: Arc<dyn GroupRepository>,
    config: DirectoryConfig,
}

impl VouchService {
    /// Create a new VouchService
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        vouches: Arc<dyn VouchRepository>,
        groups: Arc<dyn GroupRepository>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            profiles,
            vouches,
            groups,
            config,
        }
    }

    fn load_profile(&self, id: ProfileId) -> Result<Profile> {
        self.profiles
            .find_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("profile", id.to_string()))
    }

    /// Records a vouch for `vouchee`.
    ///
    /// # Arguments
    ///
    /// * `vouchee` - Profile receiving the vouch
    /// * `voucher` - Vouching profile, or `None` for a system vouch
    /// * `description` - Reason shown alongside the vouch
    /// * `autovouch` - Whether the vouch was issued automatically
    ///
    /// # Returns
    ///
    /// - `Ok(Vouch)`: The stored vouch
    /// - `Err(DirectoryError::Validation)`: The voucher cannot vouch, the vouchee
    ///   reached the limit, or the pair already exists
    /// - `Err(DirectoryError::NotFound)`: Either profile does not exist
    pub fn vouch(
        &self,
        vouchee: ProfileId,
        voucher: Option<ProfileId>,
        description: impl Into<String>,
        autovouch: bool,
    ) -> Result<Vouch> {
        self.load_profile(vouchee)?;
        let voucher_profile = voucher.map(|id| self.load_profile(id)).transpose()?;
        let limit = self.config.vouch_count_limit;

        let received = self.vouches.find_received(vouchee)?;
        check_vouchable(vouchee, &received, voucher_profile.as_ref(), limit)
            .map_err(DirectoryError::non_field)?;

        let vouch = Vouch::new(vouchee, voucher, description, autovouch);
        match self.vouches.insert_bounded(vouch.clone(), limit) {
            Ok(count) => {
                tracing::info!(
                    "Vouch {} recorded for {} by {:?} ({} received)",
                    vouch.id,
                    vouchee,
                    voucher,
                    count
                );
            }
            Err(e) if e.is_conflict() => {
                return Err(self.explain_conflict(vouchee, voucher_profile.as_ref())?);
            }
            Err(e) => return Err(e),
        }

        self.refresh_flags(vouchee)?;
        Ok(vouch)
    }

    /// Re-runs the eligibility rules against fresh data after storage
    /// refused an insert.
    fn explain_conflict(&self, vouchee: ProfileId, voucher: Option<&Profile>) -> Result<DirectoryError> {
        let received = self.vouches.find_received(vouchee)?;
        let rejection = check_vouchable(vouchee, &received, voucher, self.config.vouch_count_limit)
            .err()
            .unwrap_or(Rejection::ConcurrentModification);
        tracing::warn!("Vouch for {} lost a race: {}", vouchee, rejection);
        Ok(DirectoryError::non_field(rejection))
    }

    /// Recomputes `is_vouched` and `can_vouch` from stored vouches.
    ///
    /// The flags are written through an atomic profile update, and the count
    /// is re-read afterwards so a vouch recorded in between is not lost.
    fn refresh_flags(&self, id: ProfileId) -> Result<()> {
        let mut received = self.vouches.find_received(id)?.len();
        for _ in 0..FLAG_REFRESH_ATTEMPTS {
            let mut changed = false;
            let outcome = self.profiles.update(id, &mut |profile: &mut Profile| {
                changed = apply_vouch_flags(profile, received, &self.config);
                Ok(())
            });
            let profile = match outcome {
                Ok(profile) => profile,
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => return Err(e),
            };
            if changed {
                tracing::info!(
                    "Vouch flags of {} are now is_vouched={} can_vouch={}",
                    id,
                    profile.is_vouched,
                    profile.can_vouch
                );
            }
            let current = self.vouches.find_received(id)?.len();
            if current == received {
                return Ok(());
            }
            tracing::debug!("Vouch count of {} moved from {} to {}", id, received, current);
            received = current;
        }
        Ok(())
    }

    /// Issues the automatic system vouch when the login email belongs to an
    /// auto-vouch domain and no such vouch exists yet.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Vouch))`: A system vouch was issued
    /// - `Ok(None)`: The profile does not qualify or already has one
    pub fn auto_vouch(&self, id: ProfileId) -> Result<Option<Vouch>> {
        let profile = self.load_profile(id)?;
        let received = self.vouches.find_received(id)?;
        if !needs_auto_vouch(&profile, &received, &self.config) {
            return Ok(None);
        }
        let reason = self.config.auto_vouch_reason.clone();
        self.vouch(id, None, reason, true).map(Some)
    }

    /// Removes a vouch and recomputes the vouchee's flags.
    pub fn unvouch(&self, id: VouchId) -> Result<Option<Vouch>> {
        let Some(removed) = self.vouches.delete(id)? else {
            return Ok(None);
        };
        tracing::info!("Vouch {} removed from {}", removed.id, removed.vouchee);
        self.refresh_flags(removed.vouchee)?;
        Ok(Some(removed))
    }

    /// Deletes a profile together with its place in the graph.
    ///
    /// Vouches it received are deleted. Vouches it made stay with their
    /// voucher cleared, so vouchees keep their status. Memberships and
    /// curatorships in every group are removed.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Profile deleted
    /// - `Ok(false)`: Profile did not exist
    pub fn delete_profile(&self, id: ProfileId) -> Result<bool> {
        let received = self.vouches.delete_received(id)?;
        let made = self.vouches.detach_voucher(id)?;

        let groups = self.groups.find_for_profile(id)?;
        for group in &groups {
            self.forget_in_group(group.id, id)?;
        }

        let deleted = self.profiles.delete(id)?;
        if deleted {
            tracing::info!(
                "Deleted profile {}: {} received vouches removed, {} made vouches detached, {} groups updated",
                id,
                received.len(),
                made.len(),
                groups.len()
            );
        }
        Ok(deleted)
    }

    fn forget_in_group(&self, group_id: GroupId, profile: ProfileId) -> Result<()> {
        for _ in 0..GROUP_WRITE_ATTEMPTS {
            let Some(mut group) = self.groups.find_by_id(group_id)? else {
                return Ok(());
            };
            if !group.forget_profile(profile) {
                return Ok(());
            }
            match self.groups.save(&group) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_conflict() => {
                    tracing::debug!("Retrying removal of {} from group {}", profile, group_id);
                }
                Err(e) => return Err(e),
            }
        }
        Err(DirectoryError::non_field(Rejection::ConcurrentModification))
    }

    fn counterparts(&self, ids: impl Iterator<Item = ProfileId>) -> Result<HashMap<ProfileId, Profile>> {
        let ids: Vec<ProfileId> = ids.collect();
        Ok(self
            .profiles
            .find_many(&ids)?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect())
    }

    /// Received vouches whose voucher is visible in `context`, oldest first.
    pub fn vouches_received(&self, id: ProfileId, context: ViewingContext) -> Result<Vec<Vouch>> {
        let received = self.vouches.find_received(id)?;
        let vouchers = self.counterparts(received.iter().filter_map(|v| v.voucher))?;
        Ok(visible_received(&received, |id: ProfileId| vouchers.get(&id), context)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Vouches made by `id` whose vouchee is visible in `context`, oldest first.
    pub fn vouches_made(&self, id: ProfileId, context: ViewingContext) -> Result<Vec<Vouch>> {
        let made = self.vouches.find_made(id)?;
        let vouchees = self.counterparts(made.iter().map(|v| v.vouchee))?;
        Ok(visible_made(&made, |id: ProfileId| vouchees.get(&id), context)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn vouched_by(&self, id: ProfileId, context: ViewingContext) -> Result<Option<ProfileId>> {
        let received = self.vouches.find_received(id)?;
        let vouchers = self.counterparts(received.iter().filter_map(|v| v.voucher))?;
        Ok(vouched_by(&received, |id: ProfileId| vouchers.get(&id), context))
    }

    pub fn date_vouched(
        &self,
        id: ProfileId,
        context: ViewingContext,
    ) -> Result<Option<DateTime<Utc>>> {
        let received = self.vouches.find_received(id)?;
        let vouchers = self.counterparts(received.iter().filter_map(|v| v.voucher))?;
        Ok(date_vouched(&received, |id: ProfileId| vouchers.get(&id), context))
    }
}
