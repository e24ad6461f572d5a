use elegant_core::models::SortBy;
use elegant_core::NoteStore;

use crate::commands::common::{format_note_lines, note_to_list_item, NoteListItem};
use crate::error::CliError;

#[derive(Debug, Default)]
pub struct ListOptions {
    pub archived: bool,
    pub search: Option<String>,
    pub tag: Option<String>,
    /// Persisted as the default order for later runs
    pub sort: Option<SortBy>,
    pub json: bool,
}

pub fn run_list(store: &NoteStore, options: ListOptions) -> Result<(), CliError> {
    store.set_show_archived(options.archived);
    store.set_search_query(options.search.as_deref().map_or("", str::trim));
    store.set_filter_tag(options.tag.as_deref());
    if let Some(sort_by) = options.sort {
        store.set_sort_by(sort_by);
    }

    let notes = store.filtered_notes();
    if options.json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn run_tags(store: &NoteStore) {
    let tags = store.all_tags();
    if tags.is_empty() {
        println!("No tags.");
    }
    for tag in tags {
        println!("{tag}");
    }
}
