//! Profile repository trait.

use super::model::Profile;
use crate::error::Result;
use crate::ids::ProfileId;

/// An abstract repository for profile persistence.
///
/// Usernames are unique; a save that would duplicate one fails with
/// `DirectoryError::Conflict`.
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Profile))`: Profile found
    /// - `Ok(None)`: Profile not found
    fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>>;

    fn find_by_username(&self, username: &str) -> Result<Option<Profile>>;

    /// Loads every profile in `ids` that exists; missing ids are skipped.
    fn find_many(&self, ids: &[ProfileId]) -> Result<Vec<Profile>>;

    /// Inserts or replaces a profile.
    ///
    /// Replacing an existing profile overwrites every field; read-modify-write
    /// of a stored profile goes through [`ProfileRepository::update`].
    fn save(&self, profile: &Profile) -> Result<()>;

    /// Applies `apply` to the stored profile as one atomic step.
    ///
    /// Nothing is stored when `apply` fails or the edited username collides
    /// with another profile.
    ///
    /// # Returns
    ///
    /// - `Ok(Profile)`: The stored result
    /// - `Err(DirectoryError::NotFound)`: No profile with `id`
    /// - `Err(DirectoryError::Conflict)`: The username is taken
    fn update(
        &self,
        id: ProfileId,
        apply: &mut dyn FnMut(&mut Profile) -> Result<()>,
    ) -> Result<Profile>;

    /// Deletes a profile.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Profile deleted
    /// - `Ok(false)`: Profile did not exist
    fn delete(&self, id: ProfileId) -> Result<bool>;
}
