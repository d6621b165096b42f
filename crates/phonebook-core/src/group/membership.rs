//! Membership transitions for a single group.
//!
//! Per (profile, group) pair the states are: no membership, pending invite,
//! pending review, active member.

use chrono::{DateTime, Duration, Utc};

use super::model::{AcceptancePolicy, Actor, Group, Membership, MembershipChange, MembershipStatus};
use crate::error::{DirectoryError, Rejection, Result};
use crate::ids::ProfileId;
use crate::privacy::{PrivacyLevel, ViewingContext};

impl Group {
    pub(super) fn enroll(&mut self, profile: ProfileId, status: MembershipStatus, now: DateTime<Utc>) {
        self.memberships
            .entry(profile)
            .and_modify(|m| {
                if m.status != status {
                    m.status = status;
                    m.date_joined = now;
                }
            })
            .or_insert_with(|| Membership::new(profile, status, now));
    }

    fn require_manager_role(&self, actor: &Actor) -> Result<()> {
        if self.can_manage(actor) {
            Ok(())
        } else {
            Err(DirectoryError::permission_denied(format!(
                "{} cannot manage members of group '{}'",
                actor.id, self.name
            )))
        }
    }

    /// Curator invites `invitee`. Active members are left alone; a pending
    /// join request is approved outright.
    pub fn invite(
        &mut self,
        actor: &Actor,
        invitee: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<MembershipChange> {
        if !self.is_curator(actor.id) {
            return Err(DirectoryError::validation("invites", Rejection::NotCuratorForInvites));
        }
        match self.status_of(invitee) {
            Some(MembershipStatus::Member) | Some(MembershipStatus::PendingInvite) => {
                Ok(MembershipChange::NoChange)
            }
            Some(MembershipStatus::PendingReview) => {
                self.enroll(invitee, MembershipStatus::Member, now);
                Ok(MembershipChange::Entered(MembershipStatus::Member))
            }
            None => {
                let mut membership = Membership::new(invitee, MembershipStatus::PendingInvite, now);
                membership.invited_by = Some(actor.id);
                self.memberships.insert(invitee, membership);
                Ok(MembershipChange::Entered(MembershipStatus::PendingInvite))
            }
        }
    }

    /// Invitee accepts a pending invitation.
    pub fn accept_invite(&mut self, profile: ProfileId, now: DateTime<Utc>) -> Result<MembershipChange> {
        match self.status_of(profile) {
            Some(MembershipStatus::PendingInvite) => {
                self.enroll(profile, MembershipStatus::Member, now);
                Ok(MembershipChange::Entered(MembershipStatus::Member))
            }
            Some(MembershipStatus::Member) => Ok(MembershipChange::NoChange),
            _ => Err(DirectoryError::non_field(Rejection::NoPendingInvite)),
        }
    }

    /// Self-join. Open groups admit directly, reviewed groups file a request,
    /// closed groups only admit a pending invitee.
    pub fn join(&mut self, profile: ProfileId, now: DateTime<Utc>) -> Result<MembershipChange> {
        match self.status_of(profile) {
            Some(MembershipStatus::Member) | Some(MembershipStatus::PendingReview) => {
                return Ok(MembershipChange::NoChange);
            }
            Some(MembershipStatus::PendingInvite) => return self.accept_invite(profile, now),
            None => {}
        }
        let status = match self.accepting_new_members {
            AcceptancePolicy::Open => MembershipStatus::Member,
            AcceptancePolicy::Reviewed => MembershipStatus::PendingReview,
            AcceptancePolicy::Closed => {
                return Err(DirectoryError::non_field(Rejection::GroupClosed));
            }
        };
        self.enroll(profile, status, now);
        Ok(MembershipChange::Entered(status))
    }

    /// Curator or administrator approves a pending join request.
    pub fn approve_request(
        &mut self,
        actor: &Actor,
        profile: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<MembershipChange> {
        self.require_manager_role(actor)?;
        if self.status_of(profile) != Some(MembershipStatus::PendingReview) {
            return Err(DirectoryError::non_field(Rejection::NoPendingRequest));
        }
        self.enroll(profile, MembershipStatus::Member, now);
        Ok(MembershipChange::Entered(MembershipStatus::Member))
    }

    /// Curator, administrator or manager adds a member directly, bypassing
    /// the acceptance policy.
    pub fn add_member(
        &mut self,
        actor: &Actor,
        profile: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<MembershipChange> {
        self.require_manager_role(actor)?;
        if self.has_member(profile) {
            return Ok(MembershipChange::NoChange);
        }
        self.enroll(profile, MembershipStatus::Member, now);
        Ok(MembershipChange::Entered(MembershipStatus::Member))
    }

    /// Removes `target`'s membership (active or pending).
    ///
    /// Removing someone who holds no membership is a no-op. When the actor
    /// is the target this is a self-leave. Otherwise the actor needs a
    /// managing role, and curators can never be removed this way.
    pub fn remove_member(&mut self, actor: &Actor, target: ProfileId) -> Result<MembershipChange> {
        if !self.memberships.contains_key(&target) {
            return Ok(MembershipChange::NoChange);
        }

        if actor.id == target {
            if self.is_curator(target) {
                return Err(DirectoryError::non_field(Rejection::CuratorCannotLeave));
            }
            let exempt = actor.is_manager() || self.is_administrator(actor.id);
            let pending = self.status_of(target).is_some_and(MembershipStatus::is_pending);
            if !self.members_can_leave && !exempt && !pending {
                return Err(DirectoryError::non_field(Rejection::GroupNotLeavable));
            }
        } else {
            self.require_manager_role(actor)?;
            if self.is_curator(target) {
                return Err(DirectoryError::non_field(Rejection::CannotRemoveCurator));
            }
        }

        self.memberships.remove(&target);
        Ok(MembershipChange::Removed)
    }

    /// Self-leave.
    pub fn leave(&mut self, actor: &Actor) -> Result<MembershipChange> {
        self.remove_member(actor, actor.id)
    }

    /// Drops active, non-curator memberships older than the group's
    /// invalidation period. Returns the removed profiles.
    pub fn expire_memberships(&mut self, now: DateTime<Utc>) -> Vec<ProfileId> {
        let Some(days) = self.invalidation_days else {
            return Vec::new();
        };
        let cutoff = Duration::days(i64::from(days));
        let expired: Vec<ProfileId> = self
            .memberships
            .values()
            .filter(|m| m.is_active() && !self.is_curator(m.profile))
            .filter(|m| {
                m.date_joined
                    .checked_add_signed(cutoff)
                    .is_some_and(|expiry| expiry <= now)
            })
            .map(|m| m.profile)
            .collect();
        for profile in &expired {
            self.memberships.remove(profile);
        }
        expired
    }

    /// Drops the membership, curatorship and administrator role held by a
    /// deleted profile. Returns whether anything changed.
    pub fn forget_profile(&mut self, profile: ProfileId) -> bool {
        let membership = self.memberships.remove(&profile).is_some();
        let curator = self.curators.remove(&profile);
        let administrator = self.administrators.remove(&profile);
        membership || curator || administrator
    }

    /// Membership entries visible in `context`.
    ///
    /// Nothing is listed below `Mozillians` clearance; pending entries are
    /// listed only for actors who manage the group.
    pub fn member_listing(&self, context: ViewingContext, actor: Option<&Actor>) -> Vec<&Membership> {
        if !context.permits(PrivacyLevel::Mozillians) {
            return Vec::new();
        }
        let show_pending = actor.is_some_and(|actor| self.can_manage(actor));
        self.memberships
            .values()
            .filter(|m| show_pending || m.is_active())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Setup {
        group: Group,
        curator: Actor,
        member: ProfileId,
    }

    fn setup(policy: AcceptancePolicy) -> Setup {
        let now = Utc::now();
        let mut group = Group::new("test group", policy);
        let curator = Actor::new(ProfileId::new());
        group.curators.insert(curator.id);
        group.enroll(curator.id, MembershipStatus::Member, now);
        let member = ProfileId::new();
        group.enroll(member, MembershipStatus::Member, now);
        Setup {
            group,
            curator,
            member,
        }
    }

    #[test]
    fn test_manager_removes_member() {
        let mut s = setup(AcceptancePolicy::Open);
        let manager = Actor::manager(ProfileId::new());
        assert_eq!(
            s.group.remove_member(&manager, s.member).unwrap(),
            MembershipChange::Removed
        );
        assert!(!s.group.has_member(s.member));
    }

    #[test]
    fn test_manager_removes_member_from_unleavable_group() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.members_can_leave = false;
        let manager = Actor::manager(ProfileId::new());
        s.group.remove_member(&manager, s.member).unwrap();
        assert!(!s.group.has_member(s.member));
    }

    #[test]
    fn test_manager_cannot_remove_curator() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.curators.insert(s.member);
        let manager = Actor::manager(ProfileId::new());
        let err = s.group.remove_member(&manager, s.member).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::CannotRemoveCurator));
        assert!(s.group.has_member(s.member));
    }

    #[test]
    fn test_member_leaves() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.leave(&Actor::new(s.member)).unwrap();
        assert!(!s.group.has_member(s.member));
    }

    #[test]
    fn test_member_cannot_leave_unleavable_group() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.members_can_leave = false;
        let err = s.group.leave(&Actor::new(s.member)).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::GroupNotLeavable));
        assert!(s.group.has_member(s.member));
    }

    #[test]
    fn test_curator_cannot_leave() {
        let mut s = setup(AcceptancePolicy::Open);
        let err = s.group.leave(&s.curator).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::CuratorCannotLeave));
    }

    #[test]
    fn test_plain_user_cannot_remove_another() {
        let mut s = setup(AcceptancePolicy::Open);
        let err = s
            .group
            .remove_member(&Actor::new(ProfileId::new()), s.member)
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(s.group.has_member(s.member));
    }

    #[test]
    fn test_curator_removes_member_twice() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.members_can_leave = false;
        let curator = s.curator;
        assert_eq!(
            s.group.remove_member(&curator, s.member).unwrap(),
            MembershipChange::Removed
        );
        let after_first = s.group.clone();
        assert_eq!(
            s.group.remove_member(&curator, s.member).unwrap(),
            MembershipChange::NoChange
        );
        assert_eq!(s.group, after_first);
    }

    #[test]
    fn test_removing_non_member_is_noop_for_anyone() {
        let mut group = Group::new("curated", AcceptancePolicy::Reviewed);
        group.curators.insert(ProfileId::new());
        let outsider = Actor::new(ProfileId::new());
        assert_eq!(
            group.remove_member(&outsider, ProfileId::new()).unwrap(),
            MembershipChange::NoChange
        );
    }

    #[test]
    fn test_invite_requires_curator() {
        let mut s = setup(AcceptancePolicy::Closed);
        let invitee = ProfileId::new();
        let err = s
            .group
            .invite(&Actor::new(s.member), invitee, Utc::now())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotCuratorForInvites));

        let change = s.group.invite(&s.curator, invitee, Utc::now()).unwrap();
        assert_eq!(change, MembershipChange::Entered(MembershipStatus::PendingInvite));
        assert_eq!(s.group.membership(invitee).unwrap().invited_by, Some(s.curator.id));

        s.group.accept_invite(invitee, Utc::now()).unwrap();
        assert!(s.group.has_member(invitee));
    }

    #[test]
    fn test_accept_without_invite() {
        let mut s = setup(AcceptancePolicy::Closed);
        let err = s.group.accept_invite(ProfileId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NoPendingInvite));
    }

    #[test]
    fn test_join_by_policy() {
        let now = Utc::now();
        let joiner = ProfileId::new();

        let mut open = setup(AcceptancePolicy::Open).group;
        assert_eq!(
            open.join(joiner, now).unwrap(),
            MembershipChange::Entered(MembershipStatus::Member)
        );

        let mut reviewed = setup(AcceptancePolicy::Reviewed);
        assert_eq!(
            reviewed.group.join(joiner, now).unwrap(),
            MembershipChange::Entered(MembershipStatus::PendingReview)
        );
        assert_eq!(reviewed.group.join(joiner, now).unwrap(), MembershipChange::NoChange);
        reviewed
            .group
            .approve_request(&reviewed.curator, joiner, now)
            .unwrap();
        assert!(reviewed.group.has_member(joiner));

        let mut closed = setup(AcceptancePolicy::Closed).group;
        let err = closed.join(joiner, now).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::GroupClosed));
    }

    #[test]
    fn test_add_member_requires_role() {
        let mut s = setup(AcceptancePolicy::Closed);
        let newcomer = ProfileId::new();
        assert!(s
            .group
            .add_member(&Actor::new(s.member), newcomer, Utc::now())
            .unwrap_err()
            .is_permission_denied());

        let admin = ProfileId::new();
        s.group.administrators.insert(admin);
        s.group
            .add_member(&Actor::new(admin), newcomer, Utc::now())
            .unwrap();
        assert!(s.group.has_member(newcomer));
    }

    #[test]
    fn test_expire_memberships_spares_curators() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.invalidation_days = Some(30);
        let later = Utc::now() + Duration::days(31);
        let expired = s.group.expire_memberships(later);
        assert_eq!(expired, vec![s.member]);
        assert!(s.group.has_member(s.curator.id));
        assert!(s.group.expire_memberships(later).is_empty());
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let mut s = setup(AcceptancePolicy::Open);
        s.group.invalidation_days = Some(u32::MAX);
        let expired = s.group.expire_memberships(Utc::now() + Duration::days(365));
        assert!(expired.is_empty());
        assert!(s.group.has_member(s.member));
    }

    #[test]
    fn test_member_listing_visibility() {
        let mut s = setup(AcceptancePolicy::Closed);
        let invitee = ProfileId::new();
        s.group.invite(&s.curator, invitee, Utc::now()).unwrap();

        assert!(s.group.member_listing(ViewingContext::anonymous(), None).is_empty());

        let vouched = ViewingContext::at(PrivacyLevel::Mozillians);
        assert_eq!(s.group.member_listing(vouched, None).len(), 2);
        assert_eq!(s.group.member_listing(vouched, Some(&s.curator)).len(), 3);
    }

    #[test]
    fn test_forget_profile_drops_curatorship() {
        let mut s = setup(AcceptancePolicy::Open);
        assert!(s.group.forget_profile(s.curator.id));
        assert!(!s.group.is_curator(s.curator.id));
        assert!(!s.group.has_member(s.curator.id));
        assert!(!s.group.forget_profile(s.curator.id));
    }
}
