//! External accounts listed on a profile (other services, websites, alternate emails).

use serde::{Deserialize, Serialize};

use crate::privacy::PrivacyLevel;

/// Service an external account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Amo,
    Bmo,
    Email,
    Bitbucket,
    Mdn,
    Sumo,
    Facebook,
    Twitter,
    Slideshare,
    Website,
    MozillaWiki,
    Remo,
    Linkedin,
    Jabber,
    Mastodon,
    Discourse,
    Landline,
    Mobile,
    MozillaPontoon,
    Transifex,
    Telegram,
    Discord,
    Mozphab,
}

impl AccountType {
    /// Display name of the service.
    pub fn name(self) -> &'static str {
        match self {
            AccountType::Amo => "Mozilla Add-ons",
            AccountType::Bmo => "Bugzilla (BMO)",
            AccountType::Email => "Alternate email address",
            AccountType::Bitbucket => "Bitbucket",
            AccountType::Mdn => "MDN",
            AccountType::Sumo => "Mozilla Support",
            AccountType::Facebook => "Facebook",
            AccountType::Twitter => "Twitter",
            AccountType::Slideshare => "SlideShare",
            AccountType::Website => "Website URL",
            AccountType::MozillaWiki => "Mozilla Wiki",
            AccountType::Remo => "Mozilla Reps",
            AccountType::Linkedin => "LinkedIn",
            AccountType::Jabber => "XMPP/Jabber",
            AccountType::Mastodon => "Mastodon",
            AccountType::Discourse => "Mozilla Discourse",
            AccountType::Landline => "Phone (Landline)",
            AccountType::Mobile => "Phone (Mobile)",
            AccountType::MozillaPontoon => "Mozilla Pontoon",
            AccountType::Transifex => "Transifex",
            AccountType::Telegram => "Telegram",
            AccountType::Discord => "Discord",
            AccountType::Mozphab => "Mozilla Phabricator",
        }
    }

    /// Profile URL template; `{identifier}` is replaced by the account name.
    pub fn url_template(self) -> Option<&'static str> {
        let template = match self {
            AccountType::Amo => "https://addons.mozilla.org/user/{identifier}/",
            AccountType::Bmo => "https://bugzilla.mozilla.org/user_profile?login={identifier}",
            AccountType::Bitbucket => "https://bitbucket.org/{identifier}",
            AccountType::Mdn => "https://developer.mozilla.org/profiles/{identifier}",
            AccountType::Sumo => "https://support.mozilla.org/user/{identifier}",
            AccountType::Facebook => "https://www.facebook.com/{identifier}",
            AccountType::Twitter => "https://twitter.com/{identifier}",
            AccountType::Slideshare => "http://www.slideshare.net/{identifier}",
            AccountType::MozillaWiki => "https://wiki.mozilla.org/User:{identifier}",
            AccountType::Remo => "https://reps.mozilla.org/u/{identifier}/",
            AccountType::Linkedin => "https://www.linkedin.com/in/{identifier}/",
            AccountType::Discourse => "https://discourse.mozilla.org/users/{identifier}",
            AccountType::MozillaPontoon => "https://pontoon.mozilla.org/contributor/{identifier}/",
            AccountType::Transifex => "https://www.transifex.com/accounts/profile/{identifier}/",
            AccountType::Telegram => "https://telegram.me/{identifier}",
            AccountType::Mozphab => "https://phabricator.services.mozilla.com/p/{identifier}/",
            AccountType::Email
            | AccountType::Website
            | AccountType::Jabber
            | AccountType::Mastodon
            | AccountType::Landline
            | AccountType::Mobile
            | AccountType::Discord => return None,
        };
        Some(template)
    }
}

/// Which redaction bucket an account is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCategory {
    Account,
    Website,
    AlternateEmail,
}

impl From<AccountType> for AccountCategory {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Website => AccountCategory::Website,
            AccountType::Email => AccountCategory::AlternateEmail,
            _ => AccountCategory::Account,
        }
    }
}

/// An account on another service, with its own visibility threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub account_type: AccountType,
    pub identifier: String,
    #[serde(default)]
    pub privacy: PrivacyLevel,
}

impl ExternalAccount {
    pub fn new(account_type: AccountType, identifier: impl Into<String>) -> Self {
        Self {
            account_type,
            identifier: identifier.into(),
            privacy: PrivacyLevel::default(),
        }
    }

    pub fn with_privacy(mut self, privacy: PrivacyLevel) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn category(&self) -> AccountCategory {
        self.account_type.into()
    }

    /// Link to the account's profile page, if the service has one.
    pub fn identifier_url(&self) -> Option<String> {
        if self.account_type == AccountType::Linkedin && self.identifier.contains("://") {
            return Some(self.identifier.clone());
        }
        self.account_type.url_template().map(|template| {
            template.replace("{identifier}", &urlencoding::encode(&self.identifier))
        })
    }
}
