//! Vouch repository trait.

use super::model::Vouch;
use crate::error::Result;
use crate::ids::{ProfileId, VouchId};

/// Storage for vouch edges.
///
/// Implementations must make `insert_bounded` atomic: the pair-uniqueness
/// and per-vouchee limit checks and the insert happen under one write.
pub trait VouchRepository: Send + Sync {
    /// Inserts a vouch unless it would duplicate a (voucher, vouchee) pair or
    /// push the vouchee past `limit` received vouches.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of vouches the vouchee has received, including this one
    /// - `Err(DirectoryError::Conflict)`: The pair exists or the limit was reached
    fn insert_bounded(&self, vouch: Vouch, limit: usize) -> Result<usize>;

    fn find_by_id(&self, id: VouchId) -> Result<Option<Vouch>>;

    /// Vouches received by `vouchee`, oldest first.
    fn find_received(&self, vouchee: ProfileId) -> Result<Vec<Vouch>>;

    /// Vouches made by `voucher`, oldest first.
    fn find_made(&self, voucher: ProfileId) -> Result<Vec<Vouch>>;

    /// Removes a vouch, returning it if it existed.
    fn delete(&self, id: VouchId) -> Result<Option<Vouch>>;

    /// Removes every vouch received by `vouchee`.
    fn delete_received(&self, vouchee: ProfileId) -> Result<Vec<Vouch>>;

    /// Clears the voucher reference on every vouch made by `voucher`,
    /// returning the affected vouches.
    fn detach_voucher(&self, voucher: ProfileId) -> Result<Vec<Vouch>>;
}
