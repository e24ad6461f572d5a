use elegant_core::NoteStore;

use crate::commands::common::resolve_note_id;
use crate::error::CliError;

pub fn run_delete(store: &NoteStore, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    store.delete_note(&id);
    println!("{id}");
    Ok(())
}
