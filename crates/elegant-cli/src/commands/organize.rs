use elegant_core::models::NoteColor;
use elegant_core::NoteStore;

use crate::cli::TagCommands;
use crate::commands::common::{render_tags, resolve_note_id};
use crate::error::CliError;

pub fn run_duplicate(store: &NoteStore, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    let copy_id = store
        .duplicate_note(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    println!("{copy_id}");
    Ok(())
}

pub fn run_pin(store: &NoteStore, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    let pinned = store
        .toggle_pin(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    println!("{id} {}", if pinned { "pinned" } else { "unpinned" });
    Ok(())
}

pub fn run_archive(store: &NoteStore, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    let archived = store
        .toggle_archive(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    println!("{id} {}", if archived { "archived" } else { "unarchived" });
    Ok(())
}

pub fn run_color(store: &NoteStore, id: &str, color: NoteColor) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    store.set_color(&id, color);
    println!("{id} {color}");
    Ok(())
}

pub fn run_tag(store: &NoteStore, command: TagCommands) -> Result<(), CliError> {
    let (id, changed) = match command {
        TagCommands::Add { id, tag } => {
            let id = resolve_note_id(store, &id)?;
            let changed = store.add_tag(&id, &tag);
            (id, changed)
        }
        TagCommands::Remove { id, tag } => {
            let id = resolve_note_id(store, &id)?;
            let changed = store.remove_tag(&id, &tag);
            (id, changed)
        }
    };

    if !changed {
        tracing::debug!("Tags unchanged for {id}");
    }
    let note = store
        .note(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    println!("{id} {}", render_tags(&note));
    Ok(())
}
