//! Vouch edge model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProfileId, VouchId};

/// An attestation from one member (or the system) to another.
///
/// Never edited after creation. The voucher reference is cleared, not the
/// vouch, when the voucher's account is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vouch {
    pub id: VouchId,
    pub vouchee: ProfileId,
    /// `None` for system-issued vouches and for vouchers whose account is gone.
    pub voucher: Option<ProfileId>,
    pub description: String,
    #[serde(default)]
    pub autovouch: bool,
    pub date: DateTime<Utc>,
}

impl Vouch {
    pub fn new(
        vouchee: ProfileId,
        voucher: Option<ProfileId>,
        description: impl Into<String>,
        autovouch: bool,
    ) -> Self {
        Self {
            id: VouchId::new(),
            vouchee,
            voucher,
            description: description.into(),
            autovouch,
            date: Utc::now(),
        }
    }

    /// A vouch issued by the system rather than a member.
    pub fn system(vouchee: ProfileId, description: impl Into<String>) -> Self {
        Self::new(vouchee, None, description, true)
    }

    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn is_system(&self) -> bool {
        self.voucher.is_none()
    }
}
