//! Redacted reads over vouch edges.
//!
//! A vouch is shown when its counterpart profile (the voucher of a received
//! vouch, the vouchee of a made vouch) has at least one controlled field
//! readable in the viewing context. System vouches are always shown, and an
//! internal context sees every vouch.

use chrono::{DateTime, Utc};

use super::model::Vouch;
use crate::ids::ProfileId;
use crate::privacy::ViewingContext;
use crate::profile::Profile;

fn counterpart_visible<'p>(
    counterpart: Option<ProfileId>,
    lookup: &impl Fn(ProfileId) -> Option<&'p Profile>,
    context: ViewingContext,
) -> bool {
    if context.is_internal() {
        return true;
    }
    match counterpart {
        None => true,
        Some(id) => lookup(id).is_some_and(|profile| profile.view(context).any_field_visible()),
    }
}

/// Received vouches whose voucher is visible.
pub fn visible_received<'v, 'p>(
    received: &'v [Vouch],
    lookup: impl Fn(ProfileId) -> Option<&'p Profile>,
    context: ViewingContext,
) -> Vec<&'v Vouch> {
    received
        .iter()
        .filter(|vouch| counterpart_visible(vouch.voucher, &lookup, context))
        .collect()
}

/// Made vouches whose vouchee is visible.
pub fn visible_made<'v, 'p>(
    made: &'v [Vouch],
    lookup: impl Fn(ProfileId) -> Option<&'p Profile>,
    context: ViewingContext,
) -> Vec<&'v Vouch> {
    made.iter()
        .filter(|vouch| counterpart_visible(Some(vouch.vouchee), &lookup, context))
        .collect()
}

/// The most recent visible member voucher.
pub fn vouched_by<'p>(
    received: &[Vouch],
    lookup: impl Fn(ProfileId) -> Option<&'p Profile>,
    context: ViewingContext,
) -> Option<ProfileId> {
    received
        .iter()
        .filter(|vouch| vouch.voucher.is_some())
        .filter(|vouch| counterpart_visible(vouch.voucher, &lookup, context))
        .max_by_key(|vouch| vouch.date)
        .and_then(|vouch| vouch.voucher)
}

/// Date of the earliest visible received vouch.
pub fn date_vouched<'p>(
    received: &[Vouch],
    lookup: impl Fn(ProfileId) -> Option<&'p Profile>,
    context: ViewingContext,
) -> Option<DateTime<Utc>> {
    visible_received(received, lookup, context)
        .into_iter()
        .map(|vouch| vouch.date)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::{PrivacyLevel, ProfileField};
    use chrono::Duration;
    use std::collections::HashMap;

    struct Fixture {
        vouchee: Profile,
        open: Profile,
        hidden: Profile,
        received: Vec<Vouch>,
    }

    fn fixture() -> Fixture {
        let vouchee = Profile::new("vouchee", "vouchee@example.com");
        let mut open = Profile::new("open", "open@example.com").with_full_name("Open");
        open.set_threshold(ProfileField::FullName, PrivacyLevel::Public).unwrap();
        let mut hidden = Profile::new("hidden", "hidden@example.com");
        hidden.set_privacy_level(PrivacyLevel::Employees);

        let start = Utc::now() - Duration::days(10);
        let received = vec![
            Vouch::system(vouchee.id, "auto").at(start),
            Vouch::new(vouchee.id, Some(open.id), "met at event", false).at(start + Duration::days(1)),
            Vouch::new(vouchee.id, Some(hidden.id), "colleague", false).at(start + Duration::days(2)),
        ];
        Fixture {
            vouchee,
            open,
            hidden,
            received,
        }
    }

    fn index(fixture: &Fixture) -> HashMap<ProfileId, &Profile> {
        [&fixture.vouchee, &fixture.open, &fixture.hidden]
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    }

    #[test]
    fn test_received_filtered_by_voucher_visibility() {
        let f = fixture();
        let profiles = index(&f);
        let lookup = |id: ProfileId| profiles.get(&id).copied();

        let anonymous = visible_received(&f.received, lookup, ViewingContext::anonymous());
        assert_eq!(anonymous.len(), 2);
        assert!(anonymous.iter().all(|v| v.voucher != Some(f.hidden.id)));

        let staff = visible_received(&f.received, lookup, ViewingContext::at(PrivacyLevel::Employees));
        assert_eq!(staff.len(), 3);
    }

    #[test]
    fn test_made_filtered_by_vouchee_visibility() {
        let f = fixture();
        let profiles = index(&f);
        let made = vec![Vouch::new(f.hidden.id, Some(f.open.id), "x", false)];
        let lookup = |id: ProfileId| profiles.get(&id).copied();
        assert!(visible_made(&made, lookup, ViewingContext::at(PrivacyLevel::Mozillians)).is_empty());
        assert_eq!(visible_made(&made, lookup, ViewingContext::internal()).len(), 1);
    }

    #[test]
    fn test_vouched_by_is_most_recent_visible() {
        let f = fixture();
        let profiles = index(&f);
        let lookup = |id: ProfileId| profiles.get(&id).copied();
        assert_eq!(
            vouched_by(&f.received, lookup, ViewingContext::internal()),
            Some(f.hidden.id)
        );
        assert_eq!(
            vouched_by(&f.received, lookup, ViewingContext::anonymous()),
            Some(f.open.id)
        );
    }

    #[test]
    fn test_date_vouched_is_earliest_visible() {
        let f = fixture();
        let profiles = index(&f);
        let lookup = |id: ProfileId| profiles.get(&id).copied();
        assert_eq!(
            date_vouched(&f.received, lookup, ViewingContext::anonymous()),
            Some(f.received[0].date)
        );
        assert_eq!(date_vouched(&[], lookup, ViewingContext::anonymous()), None);
    }

    #[test]
    fn test_missing_voucher_profile_hidden_outside_internal() {
        let f = fixture();
        let visible = visible_received(&f.received, |_| None, ViewingContext::anonymous());
        assert_eq!(visible.len(), 1);
        assert!(visible[0].is_system());

        let internal = visible_received(&f.received, |_| None, ViewingContext::internal());
        assert_eq!(internal.len(), 3);
        assert_eq!(
            vouched_by(&f.received, |_| None, ViewingContext::internal()),
            Some(f.hidden.id)
        );
    }
}
