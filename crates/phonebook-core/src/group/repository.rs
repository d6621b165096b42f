//! Group repository trait.

use super::model::Group;
use crate::error::Result;
use crate::ids::{GroupId, ProfileId};

/// An abstract repository for group persistence.
///
/// # Implementation Notes
///
/// Implementations should handle:
/// - Case-insensitive name uniqueness across names and aliases
/// - Optimistic writes: `save` only succeeds when the stored version matches
pub trait GroupRepository: Send + Sync {
    fn find_by_id(&self, id: GroupId) -> Result<Option<Group>>;

    /// Finds the group whose name or alias matches `name`, ignoring case.
    fn find_by_name(&self, name: &str) -> Result<Option<Group>>;

    fn list_all(&self) -> Result<Vec<Group>>;

    /// Groups in which `profile` holds any membership or curatorship.
    fn find_for_profile(&self, profile: ProfileId) -> Result<Vec<Group>>;

    /// Stores a new group.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Group stored
    /// - `Err(DirectoryError::Conflict)`: Another group already answers to the name
    fn insert(&self, group: &Group) -> Result<()>;

    /// Replaces a stored group.
    ///
    /// # Returns
    ///
    /// - `Ok(Group)`: The stored group with its version bumped
    /// - `Err(DirectoryError::Conflict)`: The stored version differs from `group.version`,
    ///   or the new name is taken
    /// - `Err(DirectoryError::NotFound)`: No such group
    fn save(&self, group: &Group) -> Result<Group>;

    fn delete(&self, id: GroupId) -> Result<bool>;
}
