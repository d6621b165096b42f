//! Privacy-filtered read access to a profile.

use chrono::{DateTime, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use super::account::{AccountCategory, ExternalAccount};
use super::identity::IdentityLink;
use super::model::Profile;
use super::photo::{PhotoRef, PhotoResolver};
use crate::config::DirectoryConfig;
use crate::privacy::{FieldValue, PrivacyLevel, ProfileField, ViewingContext, registry};

/// A profile seen through one viewing context.
///
/// Holds no state of its own beyond the borrowed profile and the context, so
/// repeated reads within a request always agree.
#[derive(Debug, Clone, Copy)]
pub struct ProfileView<'a> {
    profile: &'a Profile,
    context: ViewingContext,
}

impl<'a> ProfileView<'a> {
    pub fn new(profile: &'a Profile, context: ViewingContext) -> Self {
        Self { profile, context }
    }

    pub fn profile(&self) -> &'a Profile {
        self.profile
    }

    pub fn context(&self) -> ViewingContext {
        self.context
    }

    /// Whether the raw value of `field` is readable in this context.
    pub fn can_read(&self, field: ProfileField) -> bool {
        self.context.permits(self.profile.threshold(field))
    }

    /// Generic dispatcher: the stored value, or the field's redacted default.
    pub fn read(&self, field: ProfileField) -> FieldValue {
        match field {
            ProfileField::Email => FieldValue::Text(self.email()),
            _ if self.can_read(field) => self.profile.raw(field),
            _ => registry().spec(field).redacted(),
        }
    }

    /// Whether any controlled field is readable in this context.
    pub fn any_field_visible(&self) -> bool {
        ProfileField::ALL.into_iter().any(|field| self.can_read(field))
    }

    fn text(&self, field: ProfileField, value: &'a str) -> &'a str {
        if self.can_read(field) { value } else { "" }
    }

    fn optional(&self, field: ProfileField, value: &'a Option<String>) -> Option<&'a str> {
        if self.can_read(field) {
            value.as_deref()
        } else {
            None
        }
    }

    pub fn full_name(&self) -> &'a str {
        self.text(ProfileField::FullName, &self.profile.full_name)
    }

    pub fn bio(&self) -> &'a str {
        self.text(ProfileField::Bio, &self.profile.bio)
    }

    pub fn timezone(&self) -> &'a str {
        self.text(ProfileField::Timezone, &self.profile.timezone)
    }

    /// Minutes the profile's timezone is ahead of UTC now.
    pub fn timezone_offset(&self) -> Option<i32> {
        self.timezone_offset_at(Utc::now())
    }

    /// Minutes the profile's timezone is ahead of UTC at `at`; `None` when
    /// the timezone is hidden, unset or not a known zone name.
    pub fn timezone_offset_at(&self, at: DateTime<Utc>) -> Option<i32> {
        let zone: Tz = self.timezone().parse().ok()?;
        let offset = zone.offset_from_utc_datetime(&at.naive_utc()).fix();
        Some(offset.local_minus_utc() / 60)
    }

    pub fn title(&self) -> &'a str {
        self.text(ProfileField::Title, &self.profile.title)
    }

    pub fn story_link(&self) -> &'a str {
        self.text(ProfileField::StoryLink, &self.profile.story_link)
    }

    pub fn photo(&self) -> Option<&'a PhotoRef> {
        if self.can_read(ProfileField::Photo) {
            self.profile.photo.as_ref()
        } else {
            None
        }
    }

    pub fn geo_city(&self) -> Option<&'a str> {
        self.optional(ProfileField::GeoCity, &self.profile.geo_city)
    }

    pub fn geo_region(&self) -> Option<&'a str> {
        self.optional(ProfileField::GeoRegion, &self.profile.geo_region)
    }

    pub fn geo_country(&self) -> Option<&'a str> {
        self.optional(ProfileField::GeoCountry, &self.profile.geo_country)
    }

    pub fn city(&self) -> Option<&'a str> {
        self.optional(ProfileField::City, &self.profile.city)
    }

    pub fn region(&self) -> Option<&'a str> {
        self.optional(ProfileField::Region, &self.profile.region)
    }

    pub fn country(&self) -> Option<&'a str> {
        self.optional(ProfileField::Country, &self.profile.country)
    }

    pub fn date_mozillian(&self) -> Option<NaiveDate> {
        if self.can_read(ProfileField::DateMozillian) {
            self.profile.date_mozillian
        } else {
            None
        }
    }

    /// Language codes in sorted order; empty when hidden.
    pub fn languages(&self) -> Vec<&'a str> {
        if !self.can_read(ProfileField::Languages) {
            return Vec::new();
        }
        self.profile.languages.iter().map(String::as_str).collect()
    }

    /// Effective contact email.
    ///
    /// With identity links, the primary-contact identity's email filtered by
    /// that identity's own threshold (empty when hidden or when no identity
    /// is the contact). Without links, the login email gated by the email
    /// threshold.
    pub fn email(&self) -> String {
        if self.profile.identities().is_empty() {
            return if self.can_read(ProfileField::Email) {
                self.profile.login_email.clone()
            } else {
                String::new()
            };
        }
        match self.profile.primary_contact_identity() {
            Some(link) if self.context.permits(link.privacy) => link.email.clone(),
            _ => String::new(),
        }
    }

    fn accounts_in(&self, category: AccountCategory) -> Vec<&'a ExternalAccount> {
        self.profile
            .external_accounts()
            .iter()
            .filter(|account| account.category() == category)
            .filter(|account| self.context.permits(account.privacy))
            .collect()
    }

    /// Visible accounts on other services (excluding websites and emails).
    pub fn accounts(&self) -> Vec<&'a ExternalAccount> {
        self.accounts_in(AccountCategory::Account)
    }

    pub fn websites(&self) -> Vec<&'a ExternalAccount> {
        self.accounts_in(AccountCategory::Website)
    }

    pub fn alternate_emails(&self) -> Vec<&'a ExternalAccount> {
        self.accounts_in(AccountCategory::AlternateEmail)
    }

    /// Identity links whose own threshold is readable.
    pub fn identity_links(&self) -> Vec<&'a IdentityLink> {
        self.profile
            .identities()
            .iter()
            .filter(|link| self.context.permits(link.privacy))
            .collect()
    }

    /// Whether any configured indexable field is both non-empty and public.
    pub fn is_public_indexable(&self, config: &DirectoryConfig) -> bool {
        config.public_indexable_fields.iter().any(|&field| {
            self.profile.threshold(field) == PrivacyLevel::Public
                && !self.profile.raw(field).is_empty()
        })
    }

    /// Whether any controlled field is public.
    pub fn is_public(&self) -> bool {
        self.profile
            .privacy
            .iter()
            .any(|(_, level)| level == PrivacyLevel::Public)
    }

    /// Displayable photo URL. Profiles without an uploaded photo get the
    /// computed placeholder, provided their photo is readable here.
    pub fn photo_url(&self, resolver: &dyn PhotoResolver, geometry: &str) -> String {
        if self.profile.photo.is_none() && self.can_read(ProfileField::Photo) {
            return resolver.placeholder_url(self.profile.contact_email(), geometry);
        }
        resolver.thumbnail_url(self.photo(), geometry)
    }
}
