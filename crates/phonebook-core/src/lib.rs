//! Core domain of the Phonebook directory engine.
//!
//! Everything here is synchronous and storage-agnostic: privacy levels and
//! the field registry, privacy-filtered profile views, the vouch graph
//! rules, and the group membership state machine. Persistence is reached
//! only through the repository traits.

pub mod config;
pub mod error;
pub mod group;
pub mod ids;
pub mod privacy;
pub mod profile;
pub mod vouch;

// Re-export common types
pub use config::{BlacklistEntry, DirectoryConfig};
pub use error::{DirectoryError, Rejection, Result};
pub use ids::{GroupId, IdentityId, ProfileId, VouchId};
pub use privacy::{PrivacyLevel, ProfileField, Viewer, ViewingContext};
