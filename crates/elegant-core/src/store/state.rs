//! In-memory store state and the derived views computed from it.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{normalize_tag, Note, NoteId, SortBy};

/// List filter and ordering applied by [`NoteFilter::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub search_query: String,
    /// Normalized tag, or `None` for all tags
    pub filter_tag: Option<String>,
    pub show_archived: bool,
    pub sort_by: SortBy,
}

impl NoteFilter {
    /// Archive filter, then search, then tag filter, then a stable sort with
    /// pinned notes first.
    #[must_use]
    pub fn apply(&self, notes: &[Note]) -> Vec<Note> {
        let query = self.search_query.to_lowercase();
        let mut filtered: Vec<Note> = notes
            .iter()
            .filter(|note| note.is_archived == self.show_archived)
            .filter(|note| query.is_empty() || note.matches_query(&query))
            .filter(|note| {
                self.filter_tag
                    .as_deref()
                    .is_none_or(|tag| note.has_tag(tag))
            })
            .cloned()
            .collect();

        filtered.sort_by(|a, b| compare_notes(a, b, self.sort_by));
        filtered
    }
}

fn compare_notes(a: &Note, b: &Note, sort_by: SortBy) -> Ordering {
    b.is_pinned.cmp(&a.is_pinned).then_with(|| match sort_by {
        SortBy::Updated => b.updated_at.cmp(&a.updated_at),
        SortBy::Created => b.created_at.cmp(&a.created_at),
        SortBy::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
    })
}

/// Every tag used by any note, sorted and deduplicated.
#[must_use]
pub fn collect_tags(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .flat_map(|note| note.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub notes: Vec<Note>,
    pub active_note_id: Option<NoteId>,
    pub filter: NoteFilter,
    /// Local ids that the remote store has since replaced
    aliases: HashMap<NoteId, NoteId>,
}

impl StoreState {
    pub fn new(notes: Vec<Note>, sort_by: SortBy) -> Self {
        Self {
            notes: dedupe_by_id(notes),
            filter: NoteFilter {
                sort_by,
                ..NoteFilter::default()
            },
            ..Self::default()
        }
    }

    /// Follow a replaced local id to its current id
    pub fn resolve(&self, id: &NoteId) -> NoteId {
        self.aliases.get(id).unwrap_or(id).clone()
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        let id = self.resolve(id);
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn note_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
        let id = self.resolve(id);
        self.notes.iter_mut().find(|note| note.id == id)
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.active_note_id.as_ref().and_then(|id| self.note(id))
    }

    pub fn insert_front(&mut self, note: Note) {
        self.active_note_id = Some(note.id.clone());
        self.notes.insert(0, note);
    }

    /// Remove a note; the first remaining note becomes active if it was active
    pub fn remove(&mut self, id: &NoteId) -> Option<Note> {
        let id = self.resolve(id);
        let index = self.notes.iter().position(|note| note.id == id)?;
        let removed = self.notes.remove(index);
        if self.active_note_id.as_ref() == Some(&removed.id) {
            self.active_note_id = self.notes.first().map(|note| note.id.clone());
        }
        Some(removed)
    }

    /// Swap a local note's identity for the one assigned by the remote store.
    ///
    /// Returns `false` when the local note no longer exists.
    pub fn apply_remote_identity(&mut self, local_id: &NoteId, remote: &Note) -> bool {
        self.aliases.insert(local_id.clone(), remote.id.clone());

        let Some(index) = self.notes.iter().position(|note| &note.id == local_id) else {
            return false;
        };

        if self.notes.iter().any(|note| note.id == remote.id) {
            // Already folded in by a refetch; keep that copy.
            self.notes.remove(index);
        } else {
            let note = &mut self.notes[index];
            note.id = remote.id.clone();
            note.created_at = remote.created_at;
            note.updated_at = note.updated_at.max(remote.updated_at);
            note.owner_ref.clone_from(&remote.owner_ref);
        }

        if self.active_note_id.as_ref() == Some(local_id) {
            self.active_note_id = Some(remote.id.clone());
        }
        true
    }

    /// Replace the whole collection with remote state
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes = dedupe_by_id(notes);
        let active_exists = self
            .active_note_id
            .as_ref()
            .is_some_and(|id| self.notes.iter().any(|note| &note.id == id));
        if !active_exists {
            self.active_note_id = None;
        }
    }

    /// Exact id, replaced local id, or unique id prefix
    pub fn find_id(&self, query: &str) -> Result<NoteId, Vec<NoteId>> {
        let exact = NoteId::from(query);
        if let Some(note) = self.note(&exact) {
            return Ok(note.id.clone());
        }

        let matches: Vec<NoteId> = self
            .notes
            .iter()
            .filter(|note| note.id.as_str().starts_with(query))
            .map(|note| note.id.clone())
            .collect();
        match matches.as_slice() {
            [single] => Ok(single.clone()),
            _ => Err(matches),
        }
    }

    pub fn set_filter_tag(&mut self, tag: Option<&str>) {
        self.filter.filter_tag = tag.and_then(normalize_tag);
    }
}

fn dedupe_by_id(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(notes.len());
    notes
        .into_iter()
        .filter(|note| seen.insert(note.id.clone()))
        .collect()
}
