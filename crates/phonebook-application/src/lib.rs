//! Application layer for Phonebook.
//!
//! This crate provides use case implementations that coordinate between
//! domain and infrastructure layers: they derive the viewer's clearance,
//! run the core rules, persist the results and turn storage conflicts into
//! validation errors.

pub mod directory;
pub mod group_service;
pub mod profile_service;
pub mod vouch_service;

pub use directory::Directory;
pub use group_service::GroupService;
pub use profile_service::ProfileService;
pub use vouch_service::VouchService;
