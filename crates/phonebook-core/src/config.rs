use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};
use crate::privacy::ProfileField;

fn default_vouch_count_limit() -> usize {
    6
}

fn default_can_vouch_threshold() -> usize {
    3
}

fn default_auto_vouch_domains() -> Vec<String> {
    vec![
        "mozilla.com".to_string(),
        "mozillafoundation.org".to_string(),
        "getpocket.com".to_string(),
    ]
}

fn default_auto_vouch_reason() -> String {
    "An automatic vouch for being a Mozilla employee.".to_string()
}

fn default_staff_cohort() -> String {
    "staff".to_string()
}

fn default_public_indexable_fields() -> Vec<ProfileField> {
    vec![ProfileField::FullName, ProfileField::Email]
}

fn default_max_invalidation_days() -> u32 {
    730
}

/// A username refused at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Exact name (case-insensitive) or a pattern matched from the start.
    pub value: String,
    #[serde(default)]
    pub is_regex: bool,
}

impl BlacklistEntry {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_regex: false,
        }
    }

    pub fn pattern(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_regex: true,
        }
    }

    fn compile(&self) -> std::result::Result<Regex, regex::Error> {
        Regex::new(&format!("^(?:{})", self.value))
    }

    /// Whether `username` is refused by this entry.
    pub fn matches(&self, username: &str) -> bool {
        if self.is_regex {
            self.compile().is_ok_and(|re| re.is_match(username))
        } else {
            self.value.eq_ignore_ascii_case(username)
        }
    }
}

/// Tunables of the directory engine, loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Maximum number of vouches a profile may receive.
    #[serde(default = "default_vouch_count_limit")]
    pub vouch_count_limit: usize,
    /// Received vouches needed before a profile may vouch for others.
    #[serde(default = "default_can_vouch_threshold")]
    pub can_vouch_threshold: usize,
    /// Login email domains that receive a system vouch on registration.
    #[serde(default = "default_auto_vouch_domains")]
    pub auto_vouch_domains: Vec<String>,
    #[serde(default = "default_auto_vouch_reason")]
    pub auto_vouch_reason: String,
    /// Cohort whose members are cleared at the `Employees` level.
    #[serde(default = "default_staff_cohort")]
    pub staff_cohort: String,
    /// Fields that make a profile indexable when public and non-empty.
    #[serde(default = "default_public_indexable_fields")]
    pub public_indexable_fields: Vec<ProfileField>,
    /// Upper bound for a group's membership invalidation period.
    #[serde(default = "default_max_invalidation_days")]
    pub max_invalidation_days: u32,
    #[serde(default)]
    pub username_blacklist: Vec<BlacklistEntry>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            vouch_count_limit: default_vouch_count_limit(),
            can_vouch_threshold: default_can_vouch_threshold(),
            auto_vouch_domains: default_auto_vouch_domains(),
            auto_vouch_reason: default_auto_vouch_reason(),
            staff_cohort: default_staff_cohort(),
            public_indexable_fields: default_public_indexable_fields(),
            max_invalidation_days: default_max_invalidation_days(),
            username_blacklist: Vec::new(),
        }
    }
}

impl DirectoryConfig {
    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DirectoryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vouch_count_limit == 0 {
            return Err(DirectoryError::config("vouch_count_limit must be at least 1"));
        }
        if self.can_vouch_threshold > self.vouch_count_limit {
            return Err(DirectoryError::config(format!(
                "can_vouch_threshold ({}) cannot exceed vouch_count_limit ({})",
                self.can_vouch_threshold, self.vouch_count_limit
            )));
        }
        for entry in self.username_blacklist.iter().filter(|entry| entry.is_regex) {
            entry.compile().map_err(|e| {
                DirectoryError::config(format!(
                    "Invalid username blacklist pattern '{}': {}",
                    entry.value, e
                ))
            })?;
        }
        Ok(())
    }

    /// Returns true if registration must refuse `username`.
    pub fn is_username_blacklisted(&self, username: &str) -> bool {
        self.username_blacklist
            .iter()
            .any(|entry| entry.matches(username))
    }

    /// Returns true if the login email belongs to an auto-vouch domain.
    pub fn is_auto_vouch_email(&self, email: &str) -> bool {
        let email = email.to_ascii_lowercase();
        self.auto_vouch_domains
            .iter()
            .any(|domain| email.ends_with(&format!("@{}", domain.to_ascii_lowercase())))
    }
}
