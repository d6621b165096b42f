//! Group creation and the access-group provisioning rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::model::{AcceptancePolicy, Group, MembershipStatus};
use crate::error::{DirectoryError, Rejection, Result};
use crate::profile::Profile;

/// Whether `actor` may create an access group: managers always may, others
/// need a high-assurance primary-contact identity.
pub fn can_provision_access_group(actor: Option<&Profile>) -> bool {
    let Some(actor) = actor else {
        return false;
    };
    if actor.is_manager() {
        return true;
    }
    actor
        .primary_contact_identity()
        .is_some_and(|link| link.is_high_assurance())
}

/// Request to create a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub accepting_new_members: Option<AcceptancePolicy>,
    pub is_access_group: bool,
    pub new_member_criteria: String,
}

impl NewGroup {
    pub fn new(name: impl Into<String>, accepting_new_members: AcceptancePolicy) -> Self {
        Self {
            name: name.into(),
            accepting_new_members: Some(accepting_new_members),
            ..Self::default()
        }
    }

    pub fn access_group(mut self) -> Self {
        self.is_access_group = true;
        self
    }

    /// Builds the group with `creator` as its first curator and member.
    pub fn into_group(self, creator: &Profile, now: DateTime<Utc>) -> Result<Group> {
        let policy = self
            .accepting_new_members
            .ok_or_else(|| DirectoryError::validation("accepting_new_members", Rejection::FieldRequired))?;
        let mut group = Group::new(self.name.trim(), policy);
        group.description = self.description;
        group.is_access_group = self.is_access_group;
        group.new_member_criteria = self.new_member_criteria;
        group.created = now;
        group.curators = BTreeSet::from([creator.id]);
        group.enroll(creator.id, MembershipStatus::Member, now);
        Ok(group)
    }
}

/// Validates a creation request. Checks run in order: required fields, then
/// for access groups the provisioning permission, then the non-open policy.
/// Name uniqueness is checked against storage by the caller.
pub fn validate_new_group(actor: Option<&Profile>, request: &NewGroup) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(DirectoryError::validation("name", Rejection::FieldRequired));
    }
    let Some(policy) = request.accepting_new_members else {
        return Err(DirectoryError::validation(
            "accepting_new_members",
            Rejection::FieldRequired,
        ));
    };
    if request.is_access_group {
        if !can_provision_access_group(actor) {
            return Err(DirectoryError::validation(
                "is_access_group",
                Rejection::ProvisioningDenied,
            ));
        }
        if policy == AcceptancePolicy::Open {
            return Err(DirectoryError::validation(
                "is_access_group",
                Rejection::OpenAccessGroup,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::IdentityLink;

    fn with_identity(user_id: &str, email: &str) -> Profile {
        let mut profile = Profile::new("creator", email);
        profile
            .attach_identity(IdentityLink::new(user_id, email).as_primary().as_primary_contact())
            .unwrap();
        profile
    }

    #[test]
    fn test_plain_group_needs_no_provisioning() {
        let request = NewGroup::new("test group", AcceptancePolicy::Reviewed);
        assert!(validate_new_group(None, &request).is_ok());
    }

    #[test]
    fn test_missing_policy_is_required() {
        let request = NewGroup {
            name: "test group".to_string(),
            ..NewGroup::default()
        };
        assert_eq!(
            validate_new_group(None, &request).unwrap_err(),
            DirectoryError::validation("accepting_new_members", Rejection::FieldRequired)
        );
    }

    #[test]
    fn test_anonymous_cannot_provision() {
        let request = NewGroup::new("test group", AcceptancePolicy::Reviewed).access_group();
        assert_eq!(
            validate_new_group(None, &request).unwrap_err(),
            DirectoryError::validation("is_access_group", Rejection::ProvisioningDenied)
        );
    }

    #[test]
    fn test_superuser_can_provision() {
        let mut admin = Profile::new("admin", "admin@example.com");
        admin.is_superuser = true;
        let request = NewGroup::new("test group", AcceptancePolicy::Reviewed).access_group();
        assert!(validate_new_group(Some(&admin), &request).is_ok());
    }

    #[test]
    fn test_ldap_identity_can_provision_closed_group() {
        let actor = with_identity("ad|foo@mozilla.com", "foo@mozilla.com");
        for policy in [AcceptancePolicy::Closed, AcceptancePolicy::Reviewed] {
            let request = NewGroup::new("test group", policy).access_group();
            assert!(validate_new_group(Some(&actor), &request).is_ok());
        }
    }

    #[test]
    fn test_passwordless_identity_cannot_provision() {
        let actor = with_identity("email|foo@bar.com", "foo@bar.com");
        let request = NewGroup::new("test group", AcceptancePolicy::Closed).access_group();
        let err = validate_new_group(Some(&actor), &request).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::ProvisioningDenied));
        assert_eq!(
            err.to_string(),
            "is_access_group: You do not have the permissions to provision an access group."
        );
    }

    #[test]
    fn test_open_access_group_rejected_for_trusted_actor() {
        let actor = with_identity("ad|foo@bar.com", "foo@bar.com");
        let request = NewGroup::new("test group", AcceptancePolicy::Open).access_group();
        let err = validate_new_group(Some(&actor), &request).unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::OpenAccessGroup));

        let mut admin = Profile::new("admin", "admin@example.com");
        admin.is_superuser = true;
        assert!(validate_new_group(Some(&admin), &request).is_err());
    }

    #[test]
    fn test_creator_becomes_curator() {
        let creator = Profile::new("creator", "creator@example.com");
        let group = NewGroup::new("  test group ", AcceptancePolicy::Closed)
            .into_group(&creator, Utc::now())
            .unwrap();
        assert_eq!(group.name, "test group");
        assert!(group.is_curator(creator.id));
        assert!(group.has_member(creator.id));
    }
}
