//! Photo references and the display-URL contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a stored profile photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    /// Returns `None` for an empty reference.
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            None
        } else {
            Some(Self(reference))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves stored photos to displayable URLs.
///
/// Implemented by the image service outside the engine.
pub trait PhotoResolver: Send + Sync {
    /// URL of a thumbnail for `photo` at `geometry` (e.g. `"160x160"`);
    /// the default avatar when `photo` is `None`.
    fn thumbnail_url(&self, photo: Option<&PhotoRef>, geometry: &str) -> String;

    /// Computed avatar for a profile without an uploaded photo.
    fn placeholder_url(&self, email: &str, geometry: &str) -> String;
}
