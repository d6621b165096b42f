//! Privacy-controlled profile fields and their process-wide registry.
//!
//! The registry is built once on first use and is immutable afterwards. It is
//! the single source of the redacted default returned for each field when a
//! viewer's clearance is insufficient.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DirectoryError, Result};
use crate::profile::PhotoRef;

/// A profile attribute guarded by its own visibility threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Photo,
    Email,
    Bio,
    GeoCity,
    GeoRegion,
    GeoCountry,
    City,
    Region,
    Country,
    Languages,
    DateMozillian,
    Timezone,
    Title,
    StoryLink,
}

impl ProfileField {
    pub const ALL: [ProfileField; 15] = [
        ProfileField::FullName,
        ProfileField::Photo,
        ProfileField::Email,
        ProfileField::Bio,
        ProfileField::GeoCity,
        ProfileField::GeoRegion,
        ProfileField::GeoCountry,
        ProfileField::City,
        ProfileField::Region,
        ProfileField::Country,
        ProfileField::Languages,
        ProfileField::DateMozillian,
        ProfileField::Timezone,
        ProfileField::Title,
        ProfileField::StoryLink,
    ];

    /// Stable field name, as used in forms and configuration.
    pub fn name(self) -> &'static str {
        registry().spec(self).name
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileField {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        registry()
            .lookup(s)
            .ok_or_else(|| DirectoryError::not_found("profile field", s))
    }
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    OptionalText,
    Date,
    Photo,
    List,
}

/// Value returned by the generic field dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    OptionalText(Option<String>),
    Date(Option<NaiveDate>),
    Photo(Option<PhotoRef>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::OptionalText(_) => FieldKind::OptionalText,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Photo(_) => FieldKind::Photo,
            FieldValue::List(_) => FieldKind::List,
        }
    }

    /// True for the empty string, `None`, or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::OptionalText(text) => text.as_deref().is_none_or(str::is_empty),
            FieldValue::Date(date) => date.is_none(),
            FieldValue::Photo(photo) => photo.is_none(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::OptionalText(text) => text.as_deref(),
            _ => None,
        }
    }
}

/// Static description of one privacy-controlled field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: ProfileField,
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether the field may be restricted to `PrivacyLevel::Private`.
    pub accepts_private: bool,
    redacted: FieldValue,
}

impl FieldSpec {
    fn new(field: ProfileField, name: &'static str, kind: FieldKind) -> Self {
        let redacted = match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::OptionalText => FieldValue::OptionalText(None),
            FieldKind::Date => FieldValue::Date(None),
            FieldKind::Photo => FieldValue::Photo(None),
            FieldKind::List => FieldValue::List(Vec::new()),
        };
        Self {
            field,
            name,
            kind,
            accepts_private: false,
            redacted,
        }
    }

    fn accepting_private(mut self) -> Self {
        self.accepts_private = true;
        self
    }

    /// The value shown to viewers who may not read the field.
    pub fn redacted(&self) -> FieldValue {
        self.redacted.clone()
    }
}

/// Lookup table from field to its `FieldSpec`, and from name to field.
#[derive(Debug)]
pub struct FieldRegistry {
    specs: Vec<FieldSpec>,
    by_name: HashMap<&'static str, ProfileField>,
}

impl FieldRegistry {
    fn build() -> Self {
        use FieldKind::*;
        use ProfileField as F;

        let specs = vec![
            FieldSpec::new(F::FullName, "full_name", Text),
            FieldSpec::new(F::Photo, "photo", Photo),
            FieldSpec::new(F::Email, "email", Text).accepting_private(),
            FieldSpec::new(F::Bio, "bio", Text),
            FieldSpec::new(F::GeoCity, "geo_city", OptionalText),
            FieldSpec::new(F::GeoRegion, "geo_region", OptionalText),
            FieldSpec::new(F::GeoCountry, "geo_country", OptionalText),
            FieldSpec::new(F::City, "city", OptionalText),
            FieldSpec::new(F::Region, "region", OptionalText),
            FieldSpec::new(F::Country, "country", OptionalText),
            FieldSpec::new(F::Languages, "languages", List),
            FieldSpec::new(F::DateMozillian, "date_mozillian", Date),
            FieldSpec::new(F::Timezone, "timezone", Text),
            FieldSpec::new(F::Title, "title", Text),
            FieldSpec::new(F::StoryLink, "story_link", Text),
        ];
        debug_assert!(
            specs
                .iter()
                .enumerate()
                .all(|(index, spec)| spec.field.index() == index),
            "registry order must match ProfileField discriminants"
        );

        let by_name = specs.iter().map(|spec| (spec.name, spec.field)).collect();
        Self { specs, by_name }
    }

    pub fn spec(&self, field: ProfileField) -> &FieldSpec {
        &self.specs[field.index()]
    }

    /// Resolves a field by name; `privacy_`-prefixed threshold names resolve
    /// to the field they guard.
    pub fn lookup(&self, name: &str) -> Option<ProfileField> {
        let name = name.strip_prefix("privacy_").unwrap_or(name);
        self.by_name.get(name).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.specs.iter().map(|spec| spec.field)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

static FIELD_REGISTRY: Lazy<FieldRegistry> = Lazy::new(FieldRegistry::build);

/// The process-wide field registry.
pub fn registry() -> &'static FieldRegistry {
    &FIELD_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_field() {
        assert_eq!(registry().len(), ProfileField::ALL.len());
        for field in ProfileField::ALL {
            assert_eq!(registry().spec(field).field, field);
        }
    }

    #[test]
    fn test_lookup_by_name_and_threshold_name() {
        assert_eq!(registry().lookup("bio"), Some(ProfileField::Bio));
        assert_eq!(
            registry().lookup("privacy_story_link"),
            Some(ProfileField::StoryLink)
        );
        assert_eq!(registry().lookup("ircname"), None);
    }

    #[test]
    fn test_only_email_accepts_private() {
        let private: Vec<_> = registry()
            .fields()
            .filter(|field| registry().spec(*field).accepts_private)
            .collect();
        assert_eq!(private, vec![ProfileField::Email]);
    }

    #[test]
    fn test_redacted_defaults_match_kind() {
        for field in ProfileField::ALL {
            let spec = registry().spec(field);
            let redacted = spec.redacted();
            assert_eq!(redacted.kind(), spec.kind);
            assert!(redacted.is_empty(), "{field} default should be empty");
        }
    }

    #[test]
    fn test_serde_names_match_registry() {
        for field in ProfileField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.name()));
        }
    }
}
