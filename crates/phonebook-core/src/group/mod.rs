//! Groups: membership state machine, curation, section edits and the
//! access-group provisioning rule.
//!
//! # Module Structure
//!
//! - `model`: `Group`, `Membership`, `AcceptancePolicy`, `Actor`
//! - `membership`: invite / join / remove transitions and member listings
//! - `sections`: per-section edit permissions
//! - `provisioning`: group creation and access-group gating
//! - `repository`: storage trait

mod membership;
mod model;
mod provisioning;
mod repository;
mod sections;

pub use model::{
    AcceptancePolicy, Actor, Group, Membership, MembershipChange, MembershipStatus,
};
pub use provisioning::{NewGroup, can_provision_access_group, validate_new_group};
pub use repository::GroupRepository;
pub use sections::{AdminSettings, BasicInfo};
