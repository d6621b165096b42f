pub mod config_service;
pub mod logging;
pub mod memory;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::logging::init_tracing;
pub use crate::memory::{DirectorySnapshot, DirectoryStore};
pub use crate::paths::PhonebookPaths;
pub use crate::storage::write_atomic;
