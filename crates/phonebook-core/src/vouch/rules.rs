//! Vouch eligibility and the flags derived from received vouches.

use super::model::Vouch;
use crate::config::DirectoryConfig;
use crate::error::Rejection;
use crate::ids::ProfileId;
use crate::profile::Profile;

/// Checks whether `voucher` may add a vouch for `vouchee`, which has already
/// received `received`. Rules are evaluated in order:
///
/// 1. a profile cannot vouch for itself,
/// 2. a voucher that cannot vouch is refused,
/// 3. a vouchee at the configured limit is refused,
/// 4. a voucher who already vouched for the vouchee is refused.
///
/// A system vouch (`voucher == None`) only runs the limit check.
pub fn check_vouchable(
    vouchee: ProfileId,
    received: &[Vouch],
    voucher: Option<&Profile>,
    limit: usize,
) -> Result<(), Rejection> {
    if voucher.is_some_and(|v| v.id == vouchee) {
        return Err(Rejection::SelfVouch);
    }
    if voucher.is_some_and(|v| !v.can_vouch) {
        return Err(Rejection::VoucherCannotVouch);
    }
    if received.len() >= limit {
        return Err(Rejection::VouchLimitReached);
    }
    if let Some(voucher) = voucher {
        if received.iter().any(|vouch| vouch.voucher == Some(voucher.id)) {
            return Err(Rejection::AlreadyVouched);
        }
    }
    Ok(())
}

pub fn is_vouchable(
    vouchee: ProfileId,
    received: &[Vouch],
    voucher: Option<&Profile>,
    limit: usize,
) -> bool {
    check_vouchable(vouchee, received, voucher, limit).is_ok()
}

/// Recomputes `is_vouched` and `can_vouch` from the number of received
/// vouches. Returns whether either flag changed.
pub fn apply_vouch_flags(profile: &mut Profile, received: usize, config: &DirectoryConfig) -> bool {
    let is_vouched = received >= 1;
    let can_vouch = received >= config.can_vouch_threshold;
    let changed = profile.is_vouched != is_vouched || profile.can_vouch != can_vouch;
    if changed {
        profile.is_vouched = is_vouched;
        profile.can_vouch = can_vouch;
        profile.touch();
    }
    changed
}

/// Whether `profile` should receive an automatic system vouch.
pub fn needs_auto_vouch(profile: &Profile, received: &[Vouch], config: &DirectoryConfig) -> bool {
    config.is_auto_vouch_email(&profile.login_email)
        && !received
            .iter()
            .any(|vouch| vouch.is_system() && vouch.description == config.auto_vouch_reason)
}
