//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{DirectoryError, Result};
use crate::ids::{GroupId, ProfileId};
use crate::profile::Profile;

/// How a group admits new members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcceptancePolicy {
    /// Anyone may join.
    #[serde(rename = "yes")]
    Open,
    /// Join requests wait for a curator's approval.
    #[serde(rename = "by_request")]
    Reviewed,
    /// Members are added by invitation only.
    #[serde(rename = "no")]
    Closed,
}

impl AcceptancePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AcceptancePolicy::Open => "yes",
            AcceptancePolicy::Reviewed => "by_request",
            AcceptancePolicy::Closed => "no",
        }
    }
}

impl fmt::Display for AcceptancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceptancePolicy {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yes" => Ok(AcceptancePolicy::Open),
            "by_request" => Ok(AcceptancePolicy::Reviewed),
            "no" => Ok(AcceptancePolicy::Closed),
            other => Err(DirectoryError::not_found("acceptance policy", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Invited by a curator, not yet accepted.
    PendingInvite,
    /// Requested to join a reviewed group, not yet approved.
    PendingReview,
    Member,
}

impl MembershipStatus {
    pub fn is_pending(self) -> bool {
        !matches!(self, MembershipStatus::Member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub profile: ProfileId,
    pub status: MembershipStatus,
    /// When the membership entered its current status.
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub invited_by: Option<ProfileId>,
}

impl Membership {
    pub fn new(profile: ProfileId, status: MembershipStatus, now: DateTime<Utc>) -> Self {
        Self {
            profile,
            status,
            date_joined: now,
            invited_by: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Member
    }
}

/// Who performs a group transition. Managers are system administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: ProfileId,
    pub is_superuser: bool,
}

impl Actor {
    pub fn new(id: ProfileId) -> Self {
        Self {
            id,
            is_superuser: false,
        }
    }

    pub fn manager(id: ProfileId) -> Self {
        Self {
            id,
            is_superuser: true,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.is_superuser
    }
}

impl From<&Profile> for Actor {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            is_superuser: profile.is_manager(),
        }
    }
}

/// Result of a membership transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Entered(MembershipStatus),
    Removed,
    NoChange,
}

/// A named collection of members curated by a subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Former names; still reserved against reuse.
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub irc_channel: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub wiki: String,

    pub accepting_new_members: AcceptancePolicy,
    #[serde(default)]
    pub new_member_criteria: String,
    #[serde(default)]
    pub is_access_group: bool,
    #[serde(default)]
    pub functional_area: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub members_can_leave: bool,
    #[serde(default)]
    pub terms: String,
    /// Days after joining before a membership lapses.
    #[serde(default)]
    pub invalidation_days: Option<u32>,
    #[serde(default)]
    pub invite_email_text: String,

    #[serde(default)]
    pub curators: BTreeSet<ProfileId>,
    #[serde(default)]
    pub administrators: BTreeSet<ProfileId>,
    #[serde(default)]
    pub memberships: BTreeMap<ProfileId, Membership>,

    pub created: DateTime<Utc>,
    /// Optimistic-write counter, bumped by storage on every save.
    #[serde(default)]
    pub version: u64,
}

fn default_true() -> bool {
    true
}

impl Group {
    pub fn new(name: impl Into<String>, accepting_new_members: AcceptancePolicy) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            aliases: BTreeSet::new(),
            description: String::new(),
            irc_channel: String::new(),
            website: String::new(),
            wiki: String::new(),
            accepting_new_members,
            new_member_criteria: String::new(),
            is_access_group: false,
            functional_area: false,
            visible: true,
            members_can_leave: true,
            terms: String::new(),
            invalidation_days: None,
            invite_email_text: String::new(),
            curators: BTreeSet::new(),
            administrators: BTreeSet::new(),
            memberships: BTreeMap::new(),
            created: Utc::now(),
            version: 0,
        }
    }

    /// Whether `name` matches the group name or one of its aliases,
    /// ignoring case and surrounding whitespace.
    pub fn answers_to(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.name.trim().to_lowercase() == wanted
            || self
                .aliases
                .iter()
                .any(|alias| alias.trim().to_lowercase() == wanted)
    }

    pub fn membership(&self, profile: ProfileId) -> Option<&Membership> {
        self.memberships.get(&profile)
    }

    pub fn status_of(&self, profile: ProfileId) -> Option<MembershipStatus> {
        self.membership(profile).map(|m| m.status)
    }

    pub fn has_member(&self, profile: ProfileId) -> bool {
        self.membership(profile).is_some_and(Membership::is_active)
    }

    pub fn members(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.values().filter(|m| m.is_active())
    }

    pub fn member_count(&self) -> usize {
        self.members().count()
    }

    pub fn is_curator(&self, profile: ProfileId) -> bool {
        self.curators.contains(&profile)
    }

    pub fn is_administrator(&self, profile: ProfileId) -> bool {
        self.administrators.contains(&profile)
    }

    /// Curators, group administrators and managers may manage membership.
    pub fn can_manage(&self, actor: &Actor) -> bool {
        actor.is_manager() || self.is_curator(actor.id) || self.is_administrator(actor.id)
    }
}
