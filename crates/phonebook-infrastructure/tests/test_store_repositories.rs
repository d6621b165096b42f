use phonebook_core::group::{AcceptancePolicy, Group, GroupRepository};
use phonebook_core::profile::{Profile, ProfileRepository};
use phonebook_core::vouch::{Vouch, VouchRepository};
use phonebook_infrastructure::{DirectoryStore, init_tracing};
use tempfile::TempDir;

#[test]
fn test_clones_share_one_store() {
    init_tracing("phonebook=debug");
    let store = DirectoryStore::new();
    let handle = store.clone();

    let profile = Profile::new("jdoe", "jdoe@example.com");
    ProfileRepository::save(&store, &profile).unwrap();
    assert!(ProfileRepository::find_by_id(&handle, profile.id).unwrap().is_some());
}

#[test]
fn test_snapshot_restores_every_repository() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.json");

    let store = DirectoryStore::new();
    let alice = Profile::new("alice", "alice@example.com");
    let bob = Profile::new("bob", "bob@example.com");
    ProfileRepository::save(&store, &alice).unwrap();
    ProfileRepository::save(&store, &bob).unwrap();
    store
        .insert_bounded(Vouch::new(bob.id, Some(alice.id), "met at FOSDEM", false), 6)
        .unwrap();
    let mut group = Group::new("Rustaceans", AcceptancePolicy::Reviewed);
    group.curators.insert(alice.id);
    GroupRepository::insert(&store, &group).unwrap();
    store.save_to(&path).unwrap();

    let restored = DirectoryStore::load_from(&path).unwrap();
    assert_eq!(
        restored.find_by_username("bob").unwrap().map(|p| p.id),
        Some(bob.id)
    );
    assert_eq!(restored.find_made(alice.id).unwrap().len(), 1);
    assert_eq!(
        restored.find_for_profile(alice.id).unwrap().first().map(|g| g.id),
        Some(group.id)
    );
}
