//! Identity links: provider-issued login identities bound to a profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::IdentityId;
use crate::privacy::PrivacyLevel;

/// Identity provider behind a login identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    Unknown,
    Passwordless,
    Google,
    Github,
    FirefoxAccounts,
    Ldap,
}

impl IdentityProvider {
    /// Providers trusted enough to provision access groups.
    pub const HIGH_ASSURANCE: [IdentityProvider; 4] = [
        IdentityProvider::Ldap,
        IdentityProvider::FirefoxAccounts,
        IdentityProvider::Github,
        IdentityProvider::Google,
    ];

    /// Classifies a provider-issued user id such as `ad|jdoe` or
    /// `github|1234`. Only called when an identity link is created.
    pub fn from_user_id(user_id: &str) -> Self {
        if user_id.contains("ad|") {
            IdentityProvider::Ldap
        } else if user_id.contains("oauth2|firefoxaccounts") {
            IdentityProvider::FirefoxAccounts
        } else if user_id.contains("github|") {
            IdentityProvider::Github
        } else if user_id.contains("google-oauth2|") {
            IdentityProvider::Google
        } else if user_id.contains("email|") {
            IdentityProvider::Passwordless
        } else {
            IdentityProvider::Unknown
        }
    }

    pub fn is_high_assurance(self) -> bool {
        Self::HIGH_ASSURANCE.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            IdentityProvider::Unknown => "Unknown Provider",
            IdentityProvider::Passwordless => "Passwordless Provider",
            IdentityProvider::Google => "Google Provider",
            IdentityProvider::Github => "Github Provider",
            IdentityProvider::FirefoxAccounts => "Firefox Accounts Provider",
            IdentityProvider::Ldap => "LDAP Provider",
        }
    }
}

/// One provider-issued identity bound to a profile.
///
/// `primary` marks the identity currently used to log in; `primary_contact`
/// marks the identity whose email is shown to other members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    pub id: IdentityId,
    provider: IdentityProvider,
    user_id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub primary_contact: bool,
    #[serde(default)]
    pub privacy: PrivacyLevel,
    pub created: DateTime<Utc>,
}

impl IdentityLink {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            id: IdentityId::new(),
            provider: IdentityProvider::from_user_id(&user_id),
            user_id,
            email: email.into(),
            username: String::new(),
            primary: false,
            primary_contact: false,
            privacy: PrivacyLevel::default(),
            created: Utc::now(),
        }
    }

    /// Marks this identity as the login identity.
    pub fn as_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Marks this identity as the contact identity.
    pub fn as_primary_contact(mut self) -> Self {
        self.primary_contact = true;
        self
    }

    pub fn with_privacy(mut self, privacy: PrivacyLevel) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn provider(&self) -> IdentityProvider {
        self.provider
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_high_assurance(&self) -> bool {
        self.provider.is_high_assurance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_user_id() {
        let cases = [
            ("ad|foo@mozilla.com", IdentityProvider::Ldap),
            ("oauth2|firefoxaccounts|abc", IdentityProvider::FirefoxAccounts),
            ("github|1234", IdentityProvider::Github),
            ("google-oauth2|5678", IdentityProvider::Google),
            ("email|foo@bar.com", IdentityProvider::Passwordless),
            ("saml|whatever", IdentityProvider::Unknown),
        ];
        for (user_id, expected) in cases {
            assert_eq!(IdentityProvider::from_user_id(user_id), expected, "{user_id}");
        }
    }

    #[test]
    fn test_high_assurance_set() {
        assert!(IdentityProvider::Ldap.is_high_assurance());
        assert!(IdentityProvider::Google.is_high_assurance());
        assert!(!IdentityProvider::Passwordless.is_high_assurance());
        assert!(!IdentityProvider::Unknown.is_high_assurance());
    }

    #[test]
    fn test_provider_is_fixed_at_creation() {
        let mut link = IdentityLink::new("ad|foo@mozilla.com", "foo@mozilla.com");
        link.email = "email|changed".to_string();
        assert_eq!(link.provider(), IdentityProvider::Ldap);
        assert_eq!(link.user_id(), "ad|foo@mozilla.com");
    }
}
