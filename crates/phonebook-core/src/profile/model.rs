//! Profile domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::account::ExternalAccount;
use super::identity::IdentityLink;
use super::photo::PhotoRef;
use crate::error::{DirectoryError, Rejection, Result};
use crate::ids::{IdentityId, ProfileId};
use crate::privacy::{FieldValue, PrivacyLevel, ProfileField, ViewingContext, registry};

/// Visibility threshold of every privacy-controlled profile field.
///
/// Each field always holds exactly one level; new profiles start at
/// `PrivacyLevel::Mozillians`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub full_name: PrivacyLevel,
    pub photo: PrivacyLevel,
    pub email: PrivacyLevel,
    pub bio: PrivacyLevel,
    pub geo_city: PrivacyLevel,
    pub geo_region: PrivacyLevel,
    pub geo_country: PrivacyLevel,
    pub city: PrivacyLevel,
    pub region: PrivacyLevel,
    pub country: PrivacyLevel,
    pub languages: PrivacyLevel,
    pub date_mozillian: PrivacyLevel,
    pub timezone: PrivacyLevel,
    pub title: PrivacyLevel,
    pub story_link: PrivacyLevel,
}

impl PrivacySettings {
    pub fn get(&self, field: ProfileField) -> PrivacyLevel {
        *self.slot(field)
    }

    /// Sets one threshold. `Private` is only accepted by fields whose
    /// registry entry allows it.
    pub fn set(&mut self, field: ProfileField, level: PrivacyLevel) -> Result<()> {
        if level == PrivacyLevel::Private && !registry().spec(field).accepts_private {
            return Err(DirectoryError::validation(
                format!("privacy_{}", field.name()),
                Rejection::PrivateNotAllowed,
            ));
        }
        *self.slot_mut(field) = level;
        Ok(())
    }

    /// Sets every threshold to `level`, clamping `Private` to `Employees`
    /// on fields that do not accept it.
    pub fn set_all(&mut self, level: PrivacyLevel) {
        for field in ProfileField::ALL {
            let effective = if level == PrivacyLevel::Private
                && !registry().spec(field).accepts_private
            {
                PrivacyLevel::Employees
            } else {
                level
            };
            *self.slot_mut(field) = effective;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileField, PrivacyLevel)> + '_ {
        ProfileField::ALL.into_iter().map(|field| (field, self.get(field)))
    }

    fn slot(&self, field: ProfileField) -> &PrivacyLevel {
        match field {
            ProfileField::FullName => &self.full_name,
            ProfileField::Photo => &self.photo,
            ProfileField::Email => &self.email,
            ProfileField::Bio => &self.bio,
            ProfileField::GeoCity => &self.geo_city,
            ProfileField::GeoRegion => &self.geo_region,
            ProfileField::GeoCountry => &self.geo_country,
            ProfileField::City => &self.city,
            ProfileField::Region => &self.region,
            ProfileField::Country => &self.country,
            ProfileField::Languages => &self.languages,
            ProfileField::DateMozillian => &self.date_mozillian,
            ProfileField::Timezone => &self.timezone,
            ProfileField::Title => &self.title,
            ProfileField::StoryLink => &self.story_link,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> &mut PrivacyLevel {
        match field {
            ProfileField::FullName => &mut self.full_name,
            ProfileField::Photo => &mut self.photo,
            ProfileField::Email => &mut self.email,
            ProfileField::Bio => &mut self.bio,
            ProfileField::GeoCity => &mut self.geo_city,
            ProfileField::GeoRegion => &mut self.geo_region,
            ProfileField::GeoCountry => &mut self.geo_country,
            ProfileField::City => &mut self.city,
            ProfileField::Region => &mut self.region,
            ProfileField::Country => &mut self.country,
            ProfileField::Languages => &mut self.languages,
            ProfileField::DateMozillian => &mut self.date_mozillian,
            ProfileField::Timezone => &mut self.timezone,
            ProfileField::Title => &mut self.title,
            ProfileField::StoryLink => &mut self.story_link,
        }
    }
}

/// A member profile.
///
/// Owns its identity links and external accounts. Reads that must respect
/// privacy go through [`Profile::view`]; direct field access is raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
    /// Email of the login account; shown only when no identity link exists.
    pub login_email: String,
    #[serde(default)]
    pub is_superuser: bool,
    /// Organisation cohorts the account belongs to (e.g. `staff`).
    #[serde(default)]
    pub cohorts: BTreeSet<String>,

    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo: Option<PhotoRef>,
    #[serde(default)]
    pub geo_city: Option<String>,
    #[serde(default)]
    pub geo_region: Option<String>,
    #[serde(default)]
    pub geo_country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Language codes, kept sorted and unique.
    #[serde(default)]
    pub languages: BTreeSet<String>,
    #[serde(default)]
    pub date_mozillian: Option<NaiveDate>,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub story_link: String,

    /// Derived from received vouches; never edited directly.
    #[serde(default)]
    pub is_vouched: bool,
    /// Derived from received vouches; never edited directly.
    #[serde(default)]
    pub can_vouch: bool,

    #[serde(default)]
    pub privacy: PrivacySettings,
    #[serde(default)]
    identities: Vec<IdentityLink>,
    #[serde(default)]
    external_accounts: Vec<ExternalAccount>,
    /// User id of the primary (login) identity.
    #[serde(default)]
    pub primary_user_id: String,
    pub last_updated: DateTime<Utc>,
}

impl Profile {
    pub fn new(username: impl Into<String>, login_email: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            username: username.into(),
            login_email: login_email.into(),
            is_superuser: false,
            cohorts: BTreeSet::new(),
            full_name: String::new(),
            bio: String::new(),
            photo: None,
            geo_city: None,
            geo_region: None,
            geo_country: None,
            city: None,
            region: None,
            country: None,
            languages: BTreeSet::new(),
            date_mozillian: None,
            timezone: String::new(),
            title: String::new(),
            story_link: String::new(),
            is_vouched: false,
            can_vouch: false,
            privacy: PrivacySettings::default(),
            identities: Vec::new(),
            external_accounts: Vec::new(),
            primary_user_id: String::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn display_name(&self) -> &str {
        &self.full_name
    }

    /// A profile is complete once it has a non-blank display name.
    pub fn is_complete(&self) -> bool {
        !self.display_name().trim().is_empty()
    }

    /// System administrators manage every group.
    pub fn is_manager(&self) -> bool {
        self.is_superuser
    }

    /// Privacy-aware read access for one viewing context.
    pub fn view(&self, context: ViewingContext) -> super::ProfileView<'_> {
        super::ProfileView::new(self, context)
    }

    pub fn threshold(&self, field: ProfileField) -> PrivacyLevel {
        self.privacy.get(field)
    }

    pub fn set_threshold(&mut self, field: ProfileField, level: PrivacyLevel) -> Result<()> {
        self.privacy.set(field, level)?;
        self.touch();
        Ok(())
    }

    /// Sets every privacy-controlled field to `level`.
    pub fn set_privacy_level(&mut self, level: PrivacyLevel) {
        self.privacy.set_all(level);
        self.touch();
    }

    /// Stored value of a field, without any privacy filtering. The email
    /// field resolves through identity links like the filtered read does.
    pub fn raw(&self, field: ProfileField) -> FieldValue {
        match field {
            ProfileField::FullName => FieldValue::Text(self.full_name.clone()),
            ProfileField::Photo => FieldValue::Photo(self.photo.clone()),
            ProfileField::Email => FieldValue::Text(self.contact_email().to_string()),
            ProfileField::Bio => FieldValue::Text(self.bio.clone()),
            ProfileField::GeoCity => FieldValue::OptionalText(self.geo_city.clone()),
            ProfileField::GeoRegion => FieldValue::OptionalText(self.geo_region.clone()),
            ProfileField::GeoCountry => FieldValue::OptionalText(self.geo_country.clone()),
            ProfileField::City => FieldValue::OptionalText(self.city.clone()),
            ProfileField::Region => FieldValue::OptionalText(self.region.clone()),
            ProfileField::Country => FieldValue::OptionalText(self.country.clone()),
            ProfileField::Languages => {
                FieldValue::List(self.languages.iter().cloned().collect())
            }
            ProfileField::DateMozillian => FieldValue::Date(self.date_mozillian),
            ProfileField::Timezone => FieldValue::Text(self.timezone.clone()),
            ProfileField::Title => FieldValue::Text(self.title.clone()),
            ProfileField::StoryLink => FieldValue::Text(self.story_link.clone()),
        }
    }

    /// Unfiltered effective email: the primary-contact identity's email when
    /// the profile has identity links, the login email otherwise.
    pub fn contact_email(&self) -> &str {
        if self.identities.is_empty() {
            return &self.login_email;
        }
        self.primary_contact_identity()
            .map(|link| link.email.as_str())
            .unwrap_or(&self.login_email)
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    // ============================================================================
    // Identity links
    // ============================================================================

    pub fn identities(&self) -> &[IdentityLink] {
        &self.identities
    }

    pub fn identity(&self, id: IdentityId) -> Option<&IdentityLink> {
        self.identities.iter().find(|link| link.id == id)
    }

    pub fn primary_contact_identity(&self) -> Option<&IdentityLink> {
        self.identities.iter().find(|link| link.primary_contact)
    }

    pub fn primary_identity(&self) -> Option<&IdentityLink> {
        self.identities.iter().find(|link| link.primary)
    }

    /// Binds a new identity to this profile.
    ///
    /// The first identity (or any identity attached while none is the
    /// contact) becomes the primary-contact identity. At most one identity is
    /// primary contact and at most one is primary at any time.
    pub fn attach_identity(&mut self, mut link: IdentityLink) -> Result<IdentityId> {
        if self
            .identities
            .iter()
            .any(|existing| existing.provider() == link.provider() && existing.email == link.email)
        {
            return Err(DirectoryError::conflict(
                "identity",
                format!("{}|{:?}|{}", self.id, link.provider(), link.email),
            ));
        }

        if self.primary_contact_identity().is_none() {
            link.primary_contact = true;
        } else if link.primary_contact {
            for existing in &mut self.identities {
                existing.primary_contact = false;
            }
        }

        if link.primary {
            for existing in &mut self.identities {
                existing.primary = false;
            }
            self.primary_user_id = link.user_id().to_string();
        }

        if link.primary_contact {
            self.privacy.email = link.privacy;
        }

        let id = link.id;
        self.identities.push(link);
        self.touch();
        Ok(id)
    }

    /// Makes `id` the only primary-contact identity.
    pub fn set_primary_contact(&mut self, id: IdentityId) -> Result<()> {
        let privacy = self
            .identity(id)
            .map(|link| link.privacy)
            .ok_or_else(|| DirectoryError::not_found("identity", id.to_string()))?;
        for link in &mut self.identities {
            link.primary_contact = link.id == id;
        }
        self.privacy.email = privacy;
        self.touch();
        Ok(())
    }

    /// Removes an identity. The login identity cannot be removed; removing
    /// the contact identity hands that role to the login identity.
    pub fn detach_identity(&mut self, id: IdentityId) -> Result<IdentityLink> {
        let index = self
            .identities
            .iter()
            .position(|link| link.id == id)
            .ok_or_else(|| DirectoryError::not_found("identity", id.to_string()))?;
        if self.identities[index].primary {
            return Err(DirectoryError::validation(
                "identity",
                Rejection::CannotDetachPrimaryIdentity,
            ));
        }

        let removed = self.identities.remove(index);
        if removed.primary_contact {
            let successor = self
                .identities
                .iter()
                .position(|link| link.primary)
                .or(if self.identities.is_empty() { None } else { Some(0) });
            if let Some(successor) = successor {
                self.identities[successor].primary_contact = true;
                self.privacy.email = self.identities[successor].privacy;
            }
        }
        self.touch();
        Ok(removed)
    }

    // ============================================================================
    // External accounts
    // ============================================================================

    pub fn external_accounts(&self) -> &[ExternalAccount] {
        &self.external_accounts
    }

    pub fn add_external_account(&mut self, account: ExternalAccount) -> Result<()> {
        if self.external_accounts.iter().any(|existing| {
            existing.account_type == account.account_type
                && existing.identifier == account.identifier
        }) {
            return Err(DirectoryError::conflict(
                "external account",
                format!("{:?}:{}", account.account_type, account.identifier),
            ));
        }
        self.external_accounts.push(account);
        self.external_accounts
            .sort_by(|a, b| a.account_type.cmp(&b.account_type));
        self.touch();
        Ok(())
    }

    pub fn remove_external_account(&mut self, account: &ExternalAccount) -> bool {
        let before = self.external_accounts.len();
        self.external_accounts.retain(|existing| {
            !(existing.account_type == account.account_type
                && existing.identifier == account.identifier)
        });
        let removed = self.external_accounts.len() != before;
        if removed {
            self.touch();
        }
        removed
    }
}
