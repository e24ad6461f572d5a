use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::auth::AuthUser;
use crate::remote::InMemoryNoteGateway;

fn local_store() -> NoteStore {
    NoteStore::local(PersistedNotes::default())
}

fn user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
    }
}

fn remote_store(auth: AuthState) -> (NoteStore, Arc<InMemoryNoteGateway>) {
    let gateway = Arc::new(InMemoryNoteGateway::new());
    let store = NoteStore::with_remote(
        PersistedNotes::default(),
        gateway.clone(),
        Arc::new(auth),
    );
    (store, gateway)
}

fn signed_in_store() -> (NoteStore, Arc<InMemoryNoteGateway>) {
    remote_store(AuthState::signed_in(user("user-1")))
}

fn titles(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|note| note.title.clone()).collect()
}

#[test]
fn create_update_and_tag_scenario() {
    let store = local_store();
    let id = store.create_note();
    store.update_note(
        &id,
        NotePatch {
            title: Some("Groceries".to_string()),
            content: Some("milk, eggs".to_string()),
            ..NotePatch::default()
        },
    );
    store.add_tag(&id, "Home");

    let active = store.active_note().unwrap();
    assert_eq!(active.id, id);
    assert_eq!(active.title, "Groceries");
    assert_eq!(active.content, "milk, eggs");
    assert_eq!(active.tags, vec!["home".to_string()]);
}

#[test]
fn create_inserts_empty_note_at_front() {
    let store = local_store();
    let first = store.create_note();
    let second = store.create_note();

    let notes = store.notes();
    assert_eq!(notes[0].id, second);
    assert_eq!(notes[1].id, first);
    assert!(notes[0].title.is_empty());
    assert_eq!(notes[0].created_at, notes[0].updated_at);
    assert!(notes[0].id.is_local());
}

#[test]
fn pinned_note_precedes_more_recent_note() {
    let store = local_store();
    let a = store.create_note();
    store.update_note(&a, NotePatch::title("A"));
    let b = store.create_note();
    store.update_note(&b, NotePatch::title("B"));
    store.toggle_pin(&a);
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.update_note(&b, NotePatch::content("later"));

    assert!(store.note(&b).unwrap().updated_at > store.note(&a).unwrap().updated_at);
    assert_eq!(titles(&store.filtered_notes()), vec!["A", "B"]);
}

#[test]
fn filtered_notes_respect_archive_toggle() {
    let store = local_store();
    let live = store.create_note();
    let archived = store.create_note();
    assert_eq!(store.toggle_archive(&archived), Some(true));

    let ids: Vec<NoteId> = store.filtered_notes().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![live]);

    store.set_show_archived(true);
    assert!(store.filtered_notes().iter().all(|note| note.is_archived));
    assert_eq!(store.filtered_notes().len(), 1);
}

#[test]
fn search_and_tag_filter_combine() {
    let store = local_store();
    let milk = store.create_note();
    store.update_note(&milk, NotePatch::title("Milk run"));
    store.add_tag(&milk, "errands");
    let bread = store.create_note();
    store.update_note(&bread, NotePatch::title("Bread"));
    store.add_tag(&bread, "errands");

    store.set_filter_tag(Some(" Errands "));
    assert_eq!(store.filter().filter_tag.as_deref(), Some("errands"));
    assert_eq!(store.filtered_notes().len(), 2);

    store.set_search_query("MILK");
    assert_eq!(titles(&store.filtered_notes()), vec!["Milk run"]);

    store.set_filter_tag(None);
    store.set_search_query("");
    assert_eq!(store.filtered_notes().len(), 2);
}

#[test]
fn search_query_is_matched_verbatim() {
    let store = local_store();
    let milky = store.create_note();
    store.update_note(&milky, NotePatch::title("milky"));
    let buy_milk = store.create_note();
    store.update_note(&buy_milk, NotePatch::title("buy milk"));

    store.set_search_query(" milk");
    assert_eq!(titles(&store.filtered_notes()), vec!["buy milk"]);

    store.set_search_query("   ");
    assert!(store.filtered_notes().is_empty());

    store.set_search_query(" ");
    assert_eq!(titles(&store.filtered_notes()), vec!["buy milk"]);
}

#[test]
fn add_tag_is_idempotent() {
    let store = local_store();
    let id = store.create_note();
    assert!(store.add_tag(&id, "Work"));
    let before = store.note(&id).unwrap();

    assert!(!store.add_tag(&id, " work "));
    assert!(!store.add_tag(&id, "   "));
    assert_eq!(store.note(&id).unwrap(), before);
}

#[test]
fn remove_tag_only_touches_when_removed() {
    let store = local_store();
    let id = store.create_note();
    store.add_tag(&id, "work");
    store.add_tag(&id, "home");
    let before = store.note(&id).unwrap();

    assert!(!store.remove_tag(&id, "absent"));
    assert_eq!(store.note(&id).unwrap().updated_at, before.updated_at);

    assert!(store.remove_tag(&id, "WORK"));
    let after = store.note(&id).unwrap();
    assert_eq!(after.tags, vec!["home".to_string()]);
    assert!(after.updated_at >= before.updated_at);
}

#[test]
fn update_note_normalizes_tags_and_ignores_unknown_ids() {
    let store = local_store();
    let id = store.create_note();
    assert!(store.update_note(
        &id,
        NotePatch {
            tags: Some(vec![
                "Work".to_string(),
                " work".to_string(),
                String::new(),
                "Home".to_string(),
            ]),
            ..NotePatch::default()
        },
    ));
    assert_eq!(
        store.note(&id).unwrap().tags,
        vec!["work".to_string(), "home".to_string()]
    );

    assert!(!store.update_note(&NoteId::from("missing"), NotePatch::title("x")));
    assert_eq!(store.notes().len(), 1);
}

#[test]
fn updated_at_never_moves_backwards() {
    let store = local_store();
    let id = store.create_note();
    let mut last = store.note(&id).unwrap().updated_at;
    for index in 0..50 {
        store.update_note(&id, NotePatch::content(index.to_string()));
        let current = store.note(&id).unwrap().updated_at;
        assert!(current >= last);
        last = current;
    }
    assert_eq!(store.note(&id).unwrap().content, "49");
}

#[test]
fn set_color_refreshes_note() {
    let store = local_store();
    let id = store.create_note();
    assert!(store.set_color(&id, NoteColor::Purple));
    assert_eq!(store.note(&id).unwrap().color, NoteColor::Purple);
    assert!(!store.set_color(&NoteId::from("missing"), NoteColor::Red));
}

#[test]
fn duplicate_scenario() {
    let store = local_store();
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Groceries"));
    store.add_tag(&id, "home");

    let copy_id = store.duplicate_note(&id).unwrap();
    let copy = store.active_note().unwrap();
    assert_ne!(copy_id, id);
    assert_eq!(copy.id, copy_id);
    assert_eq!(copy.title, "Groceries (copy)");
    assert_eq!(copy.tags, vec!["home".to_string()]);
    assert_eq!(store.notes()[0].id, copy_id);
    assert_eq!(store.duplicate_note(&NoteId::from("missing")), None);
}

#[test]
fn deleting_only_active_note_clears_selection() {
    let store = local_store();
    let id = store.create_note();
    assert!(store.delete_note(&id));
    assert!(store.active_note().is_none());
    assert!(store.notes().is_empty());
    assert!(!store.delete_note(&id));
}

#[test]
fn deleting_active_note_selects_first_remaining() {
    let store = local_store();
    let older = store.create_note();
    let newer = store.create_note();
    let active = store.create_note();

    store.delete_note(&active);
    assert_eq!(store.active_note().map(|note| note.id), Some(newer.clone()));

    store.set_active_note(Some(&older));
    store.delete_note(&newer);
    assert_eq!(store.active_note().map(|note| note.id), Some(older));
}

#[test]
fn ids_stay_unique_across_mutations() {
    let store = local_store();
    let mut last = store.create_note();
    for index in 0..20 {
        let id = store.create_note();
        if index % 3 == 0 {
            store.duplicate_note(&last);
        }
        if index % 5 == 0 {
            store.delete_note(&last);
        }
        last = id;
    }

    let notes = store.notes();
    let unique: HashSet<&NoteId> = notes.iter().map(|note| &note.id).collect();
    assert_eq!(unique.len(), notes.len());
}

#[test]
fn all_tags_sorted_without_duplicates() {
    let store = local_store();
    let a = store.create_note();
    let b = store.create_note();
    store.add_tag(&a, "zeta");
    store.add_tag(&a, "alpha");
    store.add_tag(&b, "alpha");
    store.add_tag(&b, "mid");

    let tags = store.all_tags();
    assert_eq!(tags, vec!["alpha", "mid", "zeta"]);
    assert!(tags.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn resolve_id_accepts_unique_prefix() {
    let store = local_store();
    let id = store.create_note();

    assert_eq!(store.resolve_id(id.as_str()).unwrap(), id);
    let prefix = &id.as_str()[..id.as_str().len() - 3];
    assert_eq!(store.resolve_id(prefix).unwrap(), id);
    assert!(store.resolve_id("nope").unwrap_err().is_not_found());
    assert!(matches!(store.resolve_id("  "), Err(Error::InvalidInput(_))));

    store.create_note();
    assert!(matches!(store.resolve_id("note_"), Err(Error::InvalidInput(_))));
}

#[test]
fn persisted_state_keeps_notes_and_sort_only() {
    let store = local_store();
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Kept"));
    store.set_sort_by(SortBy::Title);
    store.set_search_query("transient");
    store.set_show_archived(true);

    let persisted = store.persisted_state();
    assert_eq!(persisted.sort_by, SortBy::Title);
    assert_eq!(titles(&persisted.notes), vec!["Kept"]);

    let restored = NoteStore::local(persisted);
    assert_eq!(restored.filter().sort_by, SortBy::Title);
    assert_eq!(restored.filter().search_query, "");
    assert!(!restored.filter().show_archived);
    assert!(restored.active_note().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_public_requires_sign_in() {
    let store = local_store();
    let id = store.create_note();
    let error = store.toggle_public(&id).await.unwrap_err();
    assert!(matches!(error, Error::AuthRequired));
    assert!(!store.note(&id).unwrap().is_public);
    assert_eq!(store.note(&id).unwrap().public_slug, None);

    let (anonymous, gateway) = remote_store(AuthState::anonymous());
    let id = anonymous.create_note();
    assert!(matches!(
        anonymous.toggle_public(&id).await,
        Err(Error::AuthRequired)
    ));
    assert!(!anonymous.note(&id).unwrap().is_public);
    anonymous.flush().await;
    assert!(gateway.all_rows().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn create_swaps_in_remote_identity() {
    let (store, gateway) = signed_in_store();
    let local_id = store.create_note();
    store.flush().await;

    let note = store.active_note().unwrap();
    assert_ne!(note.id, local_id);
    assert!(!note.id.is_local());
    assert_eq!(note.owner_ref.as_deref(), Some("user-1"));
    assert_eq!(store.current_id(&local_id), note.id);
    assert_eq!(store.note(&local_id).unwrap().id, note.id);
    assert!(gateway.row(&note.id).unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn edits_made_before_create_completes_reach_remote() {
    let (store, gateway) = signed_in_store();
    let local_id = store.create_note();
    store.update_note(&local_id, NotePatch::title("Groceries"));
    store.add_tag(&local_id, "home");
    store.toggle_pin(&local_id);
    store.flush().await;

    let note = store.active_note().unwrap();
    assert_eq!(note.title, "Groceries");
    let row = gateway.row(&note.id).unwrap().unwrap();
    assert_eq!(row.title, "Groceries");
    assert_eq!(row.tags, vec!["home".to_string()]);
    assert!(row.is_pinned);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_before_create_completes_removes_orphan() {
    let (store, gateway) = signed_in_store();
    let local_id = store.create_note();
    store.delete_note(&local_id);
    store.flush().await;

    assert!(store.notes().is_empty());
    assert!(store.active_note().is_none());
    assert!(gateway.all_rows().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_mirrors_to_remote() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.flush().await;
    assert_eq!(gateway.all_rows().unwrap().len(), 1);

    store.delete_note(&id);
    store.flush().await;
    assert!(gateway.all_rows().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_failures_never_roll_back_local_state() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.flush().await;

    gateway.set_offline(true);
    store.update_note(&id, NotePatch::title("Offline edit"));
    store.set_color(&id, NoteColor::Green);
    store.flush().await;

    let note = store.note(&id).unwrap();
    assert_eq!(note.title, "Offline edit");
    assert_eq!(note.color, NoteColor::Green);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_create_keeps_local_note() {
    let (store, gateway) = signed_in_store();
    gateway.fail_next_creates(1);
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Still here"));
    store.flush().await;

    let note = store.note(&id).unwrap();
    assert_eq!(note.id, id);
    assert_eq!(note.owner_ref, None);
    assert_eq!(store.local_only_notes().len(), 1);
    assert!(gateway.all_rows().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_public_assigns_and_keeps_slug() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();

    let shared = store.toggle_public(&id).await.unwrap().unwrap();
    assert!(shared.is_public);
    let slug = shared.public_slug.clone().unwrap();
    assert_eq!(slug.len(), 8);
    assert!(slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

    let unshared = store.toggle_public(&id).await.unwrap().unwrap();
    assert!(!unshared.is_public);
    assert_eq!(unshared.public_slug.as_deref(), Some(slug.as_str()));

    let reshared = store.toggle_public(&id).await.unwrap().unwrap();
    assert!(reshared.is_public);
    assert_eq!(reshared.public_slug, Some(slug.clone()));

    let row = gateway.get_by_public_slug(&slug).await.unwrap();
    assert_eq!(row.id, store.current_id(&id));
    assert!(store.toggle_public(&NoteId::from("missing")).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_public_surfaces_remote_failure() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.flush().await;

    gateway.set_offline(true);
    let error = store.toggle_public(&id).await.unwrap_err();
    assert!(matches!(error, Error::Remote(_)));
    assert!(store.note(&id).unwrap().is_public);
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_public_on_local_only_note_is_not_found() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.flush().await;
    let copy_id = store.duplicate_note(&id).unwrap();

    let error = store.toggle_public(&copy_id).await.unwrap_err();
    assert!(matches!(error, Error::NotFound(_)));
    assert!(store.note(&copy_id).unwrap().is_public);
    assert!(gateway
        .all_rows()
        .unwrap()
        .iter()
        .all(|row| !row.is_public));
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_is_not_mirrored() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Groceries"));
    store.flush().await;
    store.toggle_public(&id).await.unwrap();

    let copy_id = store.duplicate_note(&id).unwrap();
    store.flush().await;

    let copy = store.note(&copy_id).unwrap();
    assert!(copy.id.is_local());
    assert_eq!(copy.owner_ref, None);
    assert!(!copy.is_public);
    assert_eq!(copy.public_slug, None);
    assert_eq!(gateway.all_rows().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_store_does_not_mirror() {
    let (store, gateway) = remote_store(AuthState::anonymous());
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Private"));
    store.flush().await;

    assert!(gateway.all_rows().unwrap().is_empty());
    assert_eq!(store.fetch_remote().await.unwrap(), None);
    assert_eq!(store.notes().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_remote_replaces_collection() {
    let auth = AuthState::signed_in(user("user-1"));
    let (store, gateway) = remote_store(auth);
    let kept = store.create_note();
    store.flush().await;

    let mut other_device = Note::new();
    other_device.id = NoteId::from("remote-other");
    other_device.title = "From phone".to_string();
    other_device.owner_ref = Some("user-1".to_string());
    gateway.insert_row(other_device).unwrap();

    let mut foreign = Note::new();
    foreign.id = NoteId::from("remote-foreign");
    foreign.owner_ref = Some("user-2".to_string());
    gateway.insert_row(foreign).unwrap();

    assert_eq!(store.fetch_remote().await.unwrap(), Some(2));
    let ids: HashSet<NoteId> = store.notes().into_iter().map(|note| note.id).collect();
    assert!(ids.contains(&store.current_id(&kept)));
    assert!(ids.contains(&NoteId::from("remote-other")));
    assert!(store.active_note().is_some());

    gateway.delete(&store.current_id(&kept)).await.unwrap();
    store.fetch_remote().await.unwrap();
    assert!(store.active_note().is_none());
    assert_eq!(titles(&store.notes()), vec!["From phone"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_drains_queued_changes() {
    let (store, gateway) = signed_in_store();
    let id = store.create_note();
    store.update_note(&id, NotePatch::title("Before shutdown"));
    store.shutdown().await;

    let rows = gateway.all_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Before shutdown");
}
