use phonebook_application::Directory;
use phonebook_core::group::{AcceptancePolicy, MembershipChange, MembershipStatus, NewGroup};
use phonebook_core::privacy::{PrivacyLevel, ProfileField};
use phonebook_core::profile::{Profile, ProfileRepository};
use phonebook_core::{DirectoryConfig, Rejection, ViewingContext};
use phonebook_infrastructure::{ConfigService, DirectoryStore, init_tracing};
use tempfile::TempDir;

fn small_config() -> DirectoryConfig {
    DirectoryConfig {
        vouch_count_limit: 2,
        can_vouch_threshold: 1,
        ..DirectoryConfig::default()
    }
}

fn open(temp_dir: &TempDir) -> Directory {
    let config_service = ConfigService::with_path(temp_dir.path().join("config.toml"));
    Directory::open(&config_service, &temp_dir.path().join("snapshot.json")).unwrap()
}

/// Seeds a profile that may already vouch, bypassing registration.
fn seed_voucher(store: &DirectoryStore, username: &str) -> Profile {
    let mut profile = Profile::new(username, format!("{username}@example.com"));
    profile.is_vouched = true;
    profile.can_vouch = true;
    ProfileRepository::save(store, &profile).unwrap();
    profile
}

#[test]
fn test_directory_round_trip_through_disk() {
    init_tracing("phonebook=debug");
    let temp_dir = TempDir::new().unwrap();
    ConfigService::with_path(temp_dir.path().join("config.toml"))
        .save(&small_config())
        .unwrap();

    let directory = open(&temp_dir);
    assert_eq!(directory.config().vouch_count_limit, 2);

    let alice = directory
        .register(Profile::new("alice", "alice@mozilla.com").with_full_name("Alice"))
        .unwrap();
    assert!(alice.is_vouched && alice.can_vouch);

    let bob = directory.register(Profile::new("bob", "bob@example.com")).unwrap();
    let carol = directory.register(Profile::new("carol", "carol@example.com")).unwrap();
    let dave = directory.register(Profile::new("dave", "dave@example.com")).unwrap();

    let vouches = directory.vouches();
    vouches.vouch(bob.id, Some(alice.id), "worked together", false).unwrap();
    vouches.vouch(dave.id, Some(alice.id), "met at a meetup", false).unwrap();
    vouches.vouch(carol.id, Some(alice.id), "long-time contributor", false).unwrap();
    vouches.vouch(carol.id, Some(bob.id), "mentored me", false).unwrap();

    let err = vouches
        .vouch(carol.id, Some(dave.id), "one too many", false)
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::VouchLimitReached));

    let groups = directory.groups();
    let group = groups
        .create_group(Some(alice.id), NewGroup::new("Rustaceans", AcceptancePolicy::Reviewed))
        .unwrap();
    assert_eq!(
        groups.join(carol.id, group.id).unwrap(),
        MembershipChange::Entered(MembershipStatus::PendingReview)
    );
    groups.approve_request(alice.id, group.id, carol.id).unwrap();

    directory
        .persist(&temp_dir.path().join("snapshot.json"))
        .unwrap();

    let reopened = open(&temp_dir);
    let internal = ViewingContext::internal();
    assert_eq!(
        reopened.vouches().vouches_received(carol.id, internal).unwrap().len(),
        2
    );
    assert!(reopened.profiles().get(carol.id).unwrap().is_vouched);
    let group = reopened.groups().get(group.id).unwrap();
    assert_eq!(group.status_of(carol.id), Some(MembershipStatus::Member));
    assert!(group.is_curator(alice.id));
}

#[test]
fn test_concurrent_vouches_respect_limit() {
    let store = DirectoryStore::new();
    let vouchers: Vec<Profile> = (0..8)
        .map(|i| seed_voucher(&store, &format!("voucher{i}")))
        .collect();
    let directory = Directory::new(store, small_config());
    let vouchee = directory.register(Profile::new("vouchee", "vouchee@example.com")).unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = vouchers
            .iter()
            .map(|voucher| {
                let directory = &directory;
                scope.spawn(move || {
                    directory
                        .vouches()
                        .vouch(vouchee.id, Some(voucher.id), "race", false)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.rejection() == Some(Rejection::VouchLimitReached)));
    let received = directory
        .vouches()
        .vouches_received(vouchee.id, ViewingContext::internal())
        .unwrap();
    assert_eq!(received.len(), 2);
}

#[test]
fn test_redacted_reads_follow_viewer() {
    let store = DirectoryStore::new();
    let member = seed_voucher(&store, "member");
    let directory = Directory::new(store, DirectoryConfig::default());
    let mut subject = Profile::new("subject", "subject@example.com").with_full_name("Subject");
    subject.bio = "Hidden from the public".to_string();
    let subject = directory.register(subject).unwrap();

    let profiles = directory.profiles();
    assert!(
        profiles
            .read_field(subject.id, ProfileField::Bio, None)
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        profiles
            .read_field(subject.id, ProfileField::Bio, Some(member.id))
            .unwrap()
            .as_text(),
        Some("Hidden from the public")
    );

    profiles
        .set_field_privacy(subject.id, ProfileField::Email, PrivacyLevel::Private)
        .unwrap();
    assert_eq!(profiles.email_for(subject.id, Some(member.id)).unwrap(), "");
}

#[test]
fn test_privacy_edits_do_not_undo_vouch() {
    let store = DirectoryStore::new();
    let voucher = seed_voucher(&store, "voucher");
    let directory = Directory::new(store, small_config());
    let vouchee = directory.register(Profile::new("vouchee", "vouchee@example.com")).unwrap();

    std::thread::scope(|scope| {
        let directory = &directory;
        let editor = scope.spawn(move || {
            for i in 0..200 {
                let level = if i % 2 == 0 {
                    PrivacyLevel::Public
                } else {
                    PrivacyLevel::Mozillians
                };
                directory
                    .profiles()
                    .set_field_privacy(vouchee.id, ProfileField::Bio, level)
                    .unwrap();
            }
        });
        directory
            .vouches()
            .vouch(vouchee.id, Some(voucher.id), "during edits", false)
            .unwrap();
        editor.join().unwrap();
    });

    let stored = directory.profiles().get(vouchee.id).unwrap();
    assert!(stored.is_vouched);
    assert!(stored.can_vouch);
    assert_eq!(
        stored.threshold(ProfileField::Bio),
        PrivacyLevel::Mozillians
    );
}

#[test]
fn test_self_vouch_is_refused() {
    let store = DirectoryStore::new();
    let voucher = seed_voucher(&store, "voucher");
    let directory = Directory::new(store, small_config());

    let err = directory
        .vouches()
        .vouch(voucher.id, Some(voucher.id), "trust me", false)
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::SelfVouch));
    assert!(
        directory
            .vouches()
            .vouches_received(voucher.id, ViewingContext::internal())
            .unwrap()
            .is_empty()
    );
}
