//! Vouch graph: edges between members, eligibility rules, and the redacted
//! reads over them.

mod model;
mod repository;
mod rules;
mod visibility;

pub use model::Vouch;
pub use repository::VouchRepository;
pub use rules::{apply_vouch_flags, check_vouchable, is_vouchable, needs_auto_vouch};
pub use visibility::{date_vouched, visible_made, visible_received, vouched_by};
