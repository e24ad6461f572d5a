use elegant_core::NoteStore;

use crate::commands::common::{note_to_list_item, render_tags, resolve_note};
use crate::error::CliError;

pub fn run_show(store: &NoteStore, id: &str, as_json: bool) -> Result<(), CliError> {
    let note = resolve_note(store, id)?;
    store.set_active_note(Some(&note.id));

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_to_list_item(&note))?);
        return Ok(());
    }

    println!("{}", note.display_title(usize::MAX));
    println!("id:      {}", note.id);
    println!("color:   {}", note.color);
    let mut flags = Vec::new();
    if note.is_pinned {
        flags.push("pinned");
    }
    if note.is_archived {
        flags.push("archived");
    }
    if note.is_public {
        flags.push("public");
    }
    if !flags.is_empty() {
        println!("flags:   {}", flags.join(", "));
    }
    let tags = render_tags(&note);
    if !tags.is_empty() {
        println!("tags:    {tags}");
    }
    println!("created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("updated: {}", note.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
    Ok(())
}
