//! Edits to the individually-permissioned sections of a group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::model::{AcceptancePolicy, Actor, Group, MembershipStatus};
use crate::error::{DirectoryError, Rejection, Result};
use crate::ids::ProfileId;

/// Name and descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub name: String,
    pub description: String,
    pub irc_channel: String,
    pub website: String,
    pub wiki: String,
}

/// Fields reserved for system administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    pub functional_area: bool,
    pub visible: bool,
    pub members_can_leave: bool,
}

impl Group {
    pub fn basic_info(&self) -> BasicInfo {
        BasicInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            irc_channel: self.irc_channel.clone(),
            website: self.website.clone(),
            wiki: self.wiki.clone(),
        }
    }

    /// Replaces the basic section. Write access is checked by the caller;
    /// name uniqueness is checked against storage by the caller.
    ///
    /// A renamed group keeps its previous name as an alias.
    pub fn edit_basic(&mut self, info: BasicInfo) -> Result<()> {
        let name = info.name.trim();
        if name.is_empty() {
            return Err(DirectoryError::validation("name", Rejection::FieldRequired));
        }
        if !self.name.eq_ignore_ascii_case(name) {
            let previous = std::mem::replace(&mut self.name, name.to_string());
            self.aliases.retain(|alias| !alias.eq_ignore_ascii_case(name));
            self.aliases.insert(previous);
        }
        self.name = name.to_string();
        self.description = info.description;
        self.irc_channel = info.irc_channel;
        self.website = info.website;
        self.wiki = info.wiki;
        Ok(())
    }

    /// Replaces the curator set.
    ///
    /// Groups that already have curators only accept the edit from a curator
    /// or a manager, and never accept an empty set. New curators are enrolled
    /// as active members.
    pub fn edit_curators(
        &mut self,
        actor: Option<&Actor>,
        curators: BTreeSet<ProfileId>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.curators.is_empty() {
            let allowed = actor.is_some_and(|a| a.is_manager() || self.is_curator(a.id));
            if !allowed {
                return Err(DirectoryError::validation(
                    "curators",
                    Rejection::NotCuratorForCurators,
                ));
            }
            if curators.is_empty() {
                return Err(DirectoryError::validation("curators", Rejection::EmptyCuratorSet));
            }
        }
        for &curator in &curators {
            self.enroll(curator, MembershipStatus::Member, now);
        }
        self.curators = curators;
        Ok(())
    }

    pub fn admin_settings(&self) -> AdminSettings {
        AdminSettings {
            functional_area: self.functional_area,
            visible: self.visible,
            members_can_leave: self.members_can_leave,
        }
    }

    /// Only managers may change the admin section.
    pub fn edit_admin(&mut self, actor: Option<&Actor>, settings: AdminSettings) -> Result<()> {
        if !actor.is_some_and(Actor::is_manager) {
            return Err(DirectoryError::non_field(Rejection::NotAdministrator));
        }
        self.functional_area = settings.functional_area;
        self.visible = settings.visible;
        self.members_can_leave = settings.members_can_leave;
        Ok(())
    }

    pub fn edit_terms_expiration(
        &mut self,
        terms: impl Into<String>,
        invalidation_days: Option<u32>,
        max_invalidation_days: u32,
    ) -> Result<()> {
        if invalidation_days.is_some_and(|days| days > max_invalidation_days) {
            return Err(DirectoryError::validation(
                "invalidation_days",
                Rejection::InvalidationTooLong,
            ));
        }
        self.terms = terms.into();
        self.invalidation_days = invalidation_days;
        Ok(())
    }

    /// Access groups may never be open.
    pub fn edit_criteria(
        &mut self,
        accepting_new_members: AcceptancePolicy,
        new_member_criteria: impl Into<String>,
    ) -> Result<()> {
        if self.is_access_group && accepting_new_members == AcceptancePolicy::Open {
            return Err(DirectoryError::validation(
                "accepting_new_members",
                Rejection::OpenAccessGroup,
            ));
        }
        self.accepting_new_members = accepting_new_members;
        self.new_member_criteria = new_member_criteria.into();
        Ok(())
    }

    pub fn edit_custom_invite_text(&mut self, actor: &Actor, text: impl Into<String>) -> Result<()> {
        if !self.is_curator(actor.id) {
            return Err(DirectoryError::validation(
                "invite_email_text",
                Rejection::NotCuratorForInviteEmail,
            ));
        }
        self.invite_email_text = text.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NON_FIELD_ERRORS;

    fn curated() -> (Group, Actor) {
        let mut group = Group::new("test group", AcceptancePolicy::Reviewed);
        let curator = Actor::new(ProfileId::new());
        group
            .edit_curators(None, BTreeSet::from([curator.id]), Utc::now())
            .unwrap();
        (group, curator)
    }

    #[test]
    fn test_edit_basic_requires_name() {
        let mut group = Group::new("g", AcceptancePolicy::Open);
        let err = group.edit_basic(BasicInfo::default()).unwrap_err();
        assert_eq!(
            err,
            DirectoryError::validation("name", Rejection::FieldRequired)
        );

        group
            .edit_basic(BasicInfo {
                name: "test group".to_string(),
                description: "sample description".to_string(),
                irc_channel: "foobar".to_string(),
                website: "https://example.com".to_string(),
                wiki: "https://example-wiki.com".to_string(),
            })
            .unwrap();
        assert_eq!(group.basic_info().irc_channel, "foobar");
        assert!(group.aliases.contains("g"));
        assert!(group.answers_to("G"));
    }

    #[test]
    fn test_legacy_group_accepts_empty_curators() {
        let mut group = Group::new("legacy", AcceptancePolicy::Open);
        group.edit_curators(None, BTreeSet::new(), Utc::now()).unwrap();
        assert!(group.curators.is_empty());
    }

    #[test]
    fn test_curators_never_emptied() {
        let (mut group, curator) = curated();
        let err = group
            .edit_curators(Some(&curator), BTreeSet::new(), Utc::now())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::EmptyCuratorSet));
        assert!(group.is_curator(curator.id));
    }

    #[test]
    fn test_non_curator_cannot_edit_curators() {
        let (mut group, _) = curated();
        let outsider = Actor::new(ProfileId::new());
        let err = group
            .edit_curators(Some(&outsider), BTreeSet::from([outsider.id]), Utc::now())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotCuratorForCurators));
    }

    #[test]
    fn test_new_curators_become_members() {
        let (mut group, curator) = curated();
        assert!(group.has_member(curator.id));
        let second = ProfileId::new();
        group
            .edit_curators(Some(&curator), BTreeSet::from([curator.id, second]), Utc::now())
            .unwrap();
        assert!(group.has_member(second));
        assert!(group.is_curator(second));
    }

    #[test]
    fn test_edit_admin_requires_manager() {
        let mut group = Group::new("g", AcceptancePolicy::Open);
        let settings = AdminSettings {
            functional_area: true,
            visible: true,
            members_can_leave: false,
        };
        let err = group
            .edit_admin(Some(&Actor::new(ProfileId::new())), settings)
            .unwrap_err();
        assert_eq!(
            err,
            DirectoryError::validation(NON_FIELD_ERRORS, Rejection::NotAdministrator)
        );

        group
            .edit_admin(Some(&Actor::manager(ProfileId::new())), settings)
            .unwrap();
        assert_eq!(group.admin_settings(), settings);
    }

    #[test]
    fn test_invalidation_period_is_bounded() {
        let mut group = Group::new("g", AcceptancePolicy::Open);
        group.edit_terms_expiration("foobar", Some(40), 730).unwrap();
        assert_eq!(group.invalidation_days, Some(40));

        let err = group.edit_terms_expiration("", Some(1000), 730).unwrap_err();
        assert_eq!(
            err,
            DirectoryError::validation("invalidation_days", Rejection::InvalidationTooLong)
        );
        assert_eq!(group.terms, "foobar");
    }

    #[test]
    fn test_access_group_cannot_open() {
        let mut group = Group::new("g", AcceptancePolicy::Reviewed);
        group.is_access_group = true;
        let err = group.edit_criteria(AcceptancePolicy::Open, "").unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::OpenAccessGroup));
        group.edit_criteria(AcceptancePolicy::Closed, "").unwrap();
        group.edit_criteria(AcceptancePolicy::Reviewed, "Criteria").unwrap();
        assert_eq!(group.new_member_criteria, "Criteria");
    }

    #[test]
    fn test_invite_text_requires_curator() {
        let (mut group, curator) = curated();
        let err = group
            .edit_custom_invite_text(&Actor::new(ProfileId::new()), "hi")
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotCuratorForInviteEmail));
        group
            .edit_custom_invite_text(&curator, "Custom message in the email.")
            .unwrap();
        assert_eq!(group.invite_email_text, "Custom message in the email.");
    }
}
