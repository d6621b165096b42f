//! Viewer classification and the viewing context passed to every read.

use std::collections::BTreeSet;

use crate::config::DirectoryConfig;
use crate::privacy::PrivacyLevel;
use crate::profile::{Profile, ProfileId};

/// The facts about a logged-in viewer that determine clearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: ProfileId,
    pub is_superuser: bool,
    pub cohorts: BTreeSet<String>,
    pub is_vouched: bool,
}

impl Viewer {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            is_superuser: profile.is_superuser,
            cohorts: profile.cohorts.clone(),
            is_vouched: profile.is_vouched,
        }
    }
}

impl From<&Profile> for Viewer {
    fn from(profile: &Profile) -> Self {
        Viewer::from_profile(profile)
    }
}

/// Maps a viewer to a clearance level. First matching rule wins:
/// system administrator, staff cohort, vouched member, everyone else.
/// Anonymous viewers are always `Public`.
pub fn clearance(viewer: Option<&Viewer>, config: &DirectoryConfig) -> PrivacyLevel {
    let Some(viewer) = viewer else {
        return PrivacyLevel::Public;
    };
    if viewer.is_superuser {
        PrivacyLevel::Private
    } else if viewer.cohorts.contains(&config.staff_cohort) {
        PrivacyLevel::Employees
    } else if viewer.is_vouched {
        PrivacyLevel::Mozillians
    } else {
        PrivacyLevel::Public
    }
}

/// Clearance attached to a single logical request.
///
/// `None` means internal access: reads return raw stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewingContext {
    clearance: Option<PrivacyLevel>,
}

impl ViewingContext {
    /// Unfiltered access for internal and administrative code paths.
    pub fn internal() -> Self {
        Self { clearance: None }
    }

    pub fn at(level: PrivacyLevel) -> Self {
        Self {
            clearance: Some(level),
        }
    }

    pub fn for_viewer(viewer: Option<&Viewer>, config: &DirectoryConfig) -> Self {
        Self::at(clearance(viewer, config))
    }

    pub fn anonymous() -> Self {
        Self::at(PrivacyLevel::Public)
    }

    pub fn clearance(&self) -> Option<PrivacyLevel> {
        self.clearance
    }

    pub fn is_internal(&self) -> bool {
        self.clearance.is_none()
    }

    /// Whether a value guarded by `threshold` is readable in this context.
    pub fn permits(&self, threshold: PrivacyLevel) -> bool {
        match self.clearance {
            None => true,
            Some(level) => threshold.admits(level),
        }
    }
}
