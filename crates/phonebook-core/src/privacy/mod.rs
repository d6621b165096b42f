//! Privacy domain module.
//!
//! # Module Structure
//!
//! - `level`: ordered trust tiers used for thresholds and clearance
//! - `field`: privacy-controlled fields and the immutable field registry
//! - `classifier`: viewer clearance and the per-request viewing context

mod classifier;
pub mod field;
mod level;

pub use classifier::{Viewer, ViewingContext, clearance};
pub use field::{FieldKind, FieldSpec, FieldValue, ProfileField, registry};
pub use level::PrivacyLevel;
