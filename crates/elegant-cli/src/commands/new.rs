use elegant_core::models::NotePatch;
use elegant_core::{NoteId, NoteStore};

use crate::commands::common::normalize_content;

/// Fields for a note created from the command line
#[derive(Debug, Default)]
pub struct NewNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Vec<String>,
}

/// Create a note, wait for its remote copy, and print its id.
pub async fn run_new(store: &NoteStore, new_note: NewNote) -> NoteId {
    let id = store.create_note();

    let patch = NotePatch {
        title: new_note.title.map(|title| title.trim().to_string()),
        content: new_note
            .content
            .as_deref()
            .and_then(normalize_content),
        ..NotePatch::default()
    };
    if !patch.is_empty() {
        store.update_note(&id, patch);
    }
    for tag in &new_note.tags {
        store.add_tag(&id, tag);
    }

    store.flush().await;
    let id = store.current_id(&id);
    println!("{id}");
    id
}
