//! Profiles, their identity links and external accounts, and the
//! privacy-filtered view over them.

mod account;
mod identity;
mod model;
mod photo;
mod repository;
mod view;

pub use crate::ids::{IdentityId, ProfileId};
pub use account::{AccountCategory, AccountType, ExternalAccount};
pub use identity::{IdentityLink, IdentityProvider};
pub use model::{PrivacySettings, Profile};
pub use photo::{PhotoRef, PhotoResolver};
pub use repository::ProfileRepository;
pub use view::ProfileView;
