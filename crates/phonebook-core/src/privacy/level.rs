//! Privacy levels shared by field thresholds and viewer clearance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DirectoryError, Result};

/// Ordered trust tier.
///
/// Used in two roles: as the *threshold* stored next to a privacy-controlled
/// attribute (the minimum clearance needed to read it) and as the
/// *clearance* derived for a viewer. A value is readable iff
/// `clearance >= threshold`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Anyone, including anonymous visitors.
    Public,
    /// Vouched members of the directory.
    #[default]
    Mozillians,
    /// Members of the staff cohort.
    Employees,
    /// System administrators only.
    Private,
}

impl PrivacyLevel {
    pub const ALL: [PrivacyLevel; 4] = [
        PrivacyLevel::Public,
        PrivacyLevel::Mozillians,
        PrivacyLevel::Employees,
        PrivacyLevel::Private,
    ];

    /// Returns true if a viewer holding `clearance` may read a value guarded
    /// by this threshold.
    pub fn admits(self, clearance: PrivacyLevel) -> bool {
        clearance >= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Mozillians => "mozillians",
            PrivacyLevel::Employees => "employees",
            PrivacyLevel::Private => "private",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        PrivacyLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectoryError::not_found("privacy level", s))
    }
}
