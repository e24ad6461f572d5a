use elegant_core::models::NotePatch;
use elegant_core::NoteStore;

use crate::commands::common::{capture_editor_input_with_initial, resolve_note};
use crate::error::CliError;

/// Update title and/or content; with neither given, edit content in `$EDITOR`.
pub fn run_edit(
    store: &NoteStore,
    id: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<(), CliError> {
    let note = resolve_note(store, id)?;

    let patch = if title.is_none() && content.is_none() {
        let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
            return Err(CliError::EmptyEditedContent);
        };
        if edited_content == note.content {
            println!("{}", note.id);
            return Ok(());
        }
        NotePatch::content(edited_content)
    } else {
        NotePatch {
            title: title.map(|title| title.trim().to_string()),
            content,
            ..NotePatch::default()
        }
    };

    store.update_note(&note.id, patch);
    println!("{}", note.id);
    Ok(())
}
