//! Optimistic local note store.
//!
//! Every mutation applies to local state synchronously and returns. When a
//! remote gateway is attached and a user is signed in, the change is also
//! queued for the background mirror worker. Remote failures are logged and
//! never roll local state back.

mod mirror;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use state::{collect_tags, NoteFilter};

use self::mirror::{MirrorCommand, MirrorQueue};
use self::state::StoreState;
use crate::auth::{AuthProvider, AuthState};
use crate::error::{Error, Result};
use crate::models::{normalize_tag, Note, NoteColor, NoteId, NotePatch, SortBy};
use crate::persist::PersistedNotes;
use crate::remote::{NoteDraft, NoteGateway, RemotePatch};
use crate::util::random_base36;

const PUBLIC_SLUG_LEN: usize = 8;

/// Sharing state after a publish toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareState {
    pub is_public: bool,
    pub public_slug: Option<String>,
}

struct Remote {
    gateway: Arc<dyn NoteGateway>,
    queue: MirrorQueue,
}

pub struct NoteStore {
    state: Arc<Mutex<StoreState>>,
    auth: Arc<dyn AuthProvider>,
    remote: Option<Remote>,
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NoteStore")
            .field("state", &self.state)
            .field("remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

pub(crate) fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NoteStore {
    /// Local-only store with no remote mirroring
    #[must_use]
    pub fn local(persisted: PersistedNotes) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::new(
                persisted.notes,
                persisted.sort_by,
            ))),
            auth: Arc::new(AuthState::anonymous()),
            remote: None,
        }
    }

    /// Store mirrored to `gateway` whenever `auth` reports a signed-in user.
    ///
    /// Spawns the mirror worker, so this must be called inside a tokio runtime.
    pub fn with_remote(
        persisted: PersistedNotes,
        gateway: Arc<dyn NoteGateway>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let mut store = Self::local(persisted);
        store.auth = auth;
        store.remote = Some(Remote {
            queue: MirrorQueue::spawn(Arc::clone(&gateway), Arc::clone(&store.state)),
            gateway,
        });
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        lock(&self.state)
    }

    /// Signed-in owner when remote mirroring is possible
    fn mirror_owner(&self) -> Option<(&MirrorQueue, String)> {
        let remote = self.remote.as_ref()?;
        let owner = self.auth.current_user()?;
        Some((&remote.queue, owner))
    }

    fn mirror(&self, command: MirrorCommand) {
        if let Some((queue, _)) = self.mirror_owner() {
            queue.enqueue(command);
        }
    }

    fn mirror_patch(&self, id: NoteId, patch: NotePatch) {
        self.mirror(MirrorCommand::Update {
            id,
            patch: RemotePatch::from(patch),
        });
    }

    /// Current id of a note, following ids replaced by the remote store
    #[must_use]
    pub fn current_id(&self, id: &NoteId) -> NoteId {
        self.lock().resolve(id)
    }

    // Mutations

    /// Create an empty note at the front of the list and make it active
    pub fn create_note(&self) -> NoteId {
        let note = Note::new();
        let id = note.id.clone();
        let draft = NoteDraft::from(&note);
        self.lock().insert_front(note);

        if let Some((queue, owner)) = self.mirror_owner() {
            queue.enqueue(MirrorCommand::Create {
                local_id: id.clone(),
                draft,
                owner,
            });
        }
        tracing::debug!("Created note {}", id);
        id
    }

    /// Merge `patch` into a note and refresh its `updated_at`.
    ///
    /// Returns `false` when no such note exists.
    pub fn update_note(&self, id: &NoteId, patch: NotePatch) -> bool {
        let patch = patch.normalized();
        let resolved = {
            let mut state = self.lock();
            let Some(note) = state.note_mut(id) else {
                return false;
            };
            patch.apply_to(note);
            note.touch();
            note.id.clone()
        };

        if !patch.is_empty() {
            self.mirror_patch(resolved, patch);
        }
        true
    }

    pub fn delete_note(&self, id: &NoteId) -> bool {
        let Some(removed) = self.lock().remove(id) else {
            return false;
        };
        self.mirror(MirrorCommand::Delete { id: removed.id });
        true
    }

    /// Insert a copy at the front and make it active.
    ///
    /// The copy stays local until the next sync uploads it.
    pub fn duplicate_note(&self, id: &NoteId) -> Option<NoteId> {
        let mut state = self.lock();
        let copy = state.note(id)?.duplicate();
        let copy_id = copy.id.clone();
        state.insert_front(copy);
        Some(copy_id)
    }

    pub fn toggle_pin(&self, id: &NoteId) -> Option<bool> {
        self.change_note(id, |note| {
            note.is_pinned = !note.is_pinned;
            NotePatch {
                is_pinned: Some(note.is_pinned),
                ..NotePatch::default()
            }
        })
        .map(|patch| patch.is_pinned.unwrap_or_default())
    }

    pub fn toggle_archive(&self, id: &NoteId) -> Option<bool> {
        self.change_note(id, |note| {
            note.is_archived = !note.is_archived;
            NotePatch {
                is_archived: Some(note.is_archived),
                ..NotePatch::default()
            }
        })
        .map(|patch| patch.is_archived.unwrap_or_default())
    }

    pub fn set_color(&self, id: &NoteId, color: NoteColor) -> bool {
        self.update_note(
            id,
            NotePatch {
                color: Some(color),
                ..NotePatch::default()
            },
        )
    }

    /// Add a normalized tag; blank or already-present tags are a no-op.
    ///
    /// Returns `true` when the tag was added.
    pub fn add_tag(&self, id: &NoteId, tag: &str) -> bool {
        let Some(tag) = normalize_tag(tag) else {
            return false;
        };
        self.change_note(id, |note| {
            if note.has_tag(&tag) {
                return NotePatch::default();
            }
            note.tags.push(tag.clone());
            NotePatch {
                tags: Some(note.tags.clone()),
                ..NotePatch::default()
            }
        })
        .is_some_and(|patch| !patch.is_empty())
    }

    /// Remove a tag. Returns `true` when the note carried it.
    pub fn remove_tag(&self, id: &NoteId, tag: &str) -> bool {
        let Some(tag) = normalize_tag(tag) else {
            return false;
        };
        self.change_note(id, |note| {
            if !note.has_tag(&tag) {
                return NotePatch::default();
            }
            note.tags.retain(|existing| existing != &tag);
            NotePatch {
                tags: Some(note.tags.clone()),
                ..NotePatch::default()
            }
        })
        .is_some_and(|patch| !patch.is_empty())
    }

    /// Apply `change` to a note; a non-empty returned patch touches the note
    /// and is mirrored.
    fn change_note(
        &self,
        id: &NoteId,
        change: impl FnOnce(&mut Note) -> NotePatch,
    ) -> Option<NotePatch> {
        let (resolved, patch) = {
            let mut state = self.lock();
            let note = state.note_mut(id)?;
            let patch = change(note);
            if !patch.is_empty() {
                note.touch();
            }
            (note.id.clone(), patch)
        };

        if !patch.is_empty() {
            self.mirror_patch(resolved, patch.clone());
        }
        Some(patch)
    }

    /// Flip a note's public flag and wait for the remote store to accept it.
    ///
    /// A slug is generated the first time a note is made public and kept when
    /// sharing is turned off. `Ok(None)` means no such note. Local state is
    /// not rolled back when the remote update fails.
    pub async fn toggle_public(&self, id: &NoteId) -> Result<Option<ShareState>> {
        let Some((queue, _)) = self.mirror_owner() else {
            return Err(Error::AuthRequired);
        };

        let (resolved, share) = {
            let mut state = self.lock();
            let Some(note) = state.note_mut(id) else {
                return Ok(None);
            };
            note.is_public = !note.is_public;
            if note.is_public && note.public_slug.is_none() {
                note.public_slug = Some(random_base36(PUBLIC_SLUG_LEN));
            }
            note.touch();
            (
                note.id.clone(),
                ShareState {
                    is_public: note.is_public,
                    public_slug: note.public_slug.clone(),
                },
            )
        };

        queue
            .publish(
                resolved,
                RemotePatch::sharing(share.is_public, share.public_slug.clone()),
            )
            .await?;
        Ok(Some(share))
    }

    // View state

    pub fn set_active_note(&self, id: Option<&NoteId>) {
        let mut state = self.lock();
        let resolved = id.map(|id| state.resolve(id));
        state.active_note_id = resolved;
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.lock().filter.search_query = query.into();
    }

    pub fn set_filter_tag(&self, tag: Option<&str>) {
        self.lock().set_filter_tag(tag);
    }

    pub fn set_show_archived(&self, show_archived: bool) {
        self.lock().filter.show_archived = show_archived;
    }

    pub fn set_sort_by(&self, sort_by: SortBy) {
        self.lock().filter.sort_by = sort_by;
    }

    // Queries

    #[must_use]
    pub fn filter(&self) -> NoteFilter {
        self.lock().filter.clone()
    }

    #[must_use]
    pub fn active_note(&self) -> Option<Note> {
        self.lock().active_note().cloned()
    }

    /// Notes matching the current filter, in display order
    #[must_use]
    pub fn filtered_notes(&self) -> Vec<Note> {
        let state = self.lock();
        state.filter.apply(&state.notes)
    }

    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        collect_tags(&self.lock().notes)
    }

    #[must_use]
    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.lock().note(id).cloned()
    }

    /// Every note in storage order
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    /// Notes never stored remotely
    #[must_use]
    pub fn local_only_notes(&self) -> Vec<Note> {
        self.lock()
            .notes
            .iter()
            .filter(|note| note.owner_ref.is_none())
            .cloned()
            .collect()
    }

    /// Look up a note id by exact id or unique prefix
    pub fn resolve_id(&self, query: &str) -> Result<NoteId> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Note id must not be empty".to_string()));
        }
        self.lock().find_id(query).map_err(|matches| {
            if matches.is_empty() {
                Error::NotFound(query.to_string())
            } else {
                Error::InvalidInput(format!(
                    "Note id prefix '{query}' matches {} notes",
                    matches.len()
                ))
            }
        })
    }

    #[must_use]
    pub fn persisted_state(&self) -> PersistedNotes {
        let state = self.lock();
        PersistedNotes {
            notes: state.notes.clone(),
            sort_by: state.filter.sort_by,
        }
    }

    // Remote lifecycle

    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        self.auth.current_user()
    }

    pub(crate) fn gateway(&self) -> Option<&Arc<dyn NoteGateway>> {
        self.remote.as_ref().map(|remote| &remote.gateway)
    }

    /// Replace all local notes with the signed-in user's remote notes.
    ///
    /// Runs after every change already queued. Without a user this is a
    /// no-op returning `Ok(None)`.
    pub async fn fetch_remote(&self) -> Result<Option<usize>> {
        let Some((queue, owner)) = self.mirror_owner() else {
            return Ok(None);
        };
        let count = queue.refresh(owner).await?;
        tracing::debug!("Fetched {} notes from remote", count);
        Ok(Some(count))
    }

    /// Wait for every queued remote change to finish
    pub async fn flush(&self) {
        if let Some(remote) = &self.remote {
            remote.queue.flush().await;
        }
    }

    /// Drain queued remote changes and stop the mirror worker
    pub async fn shutdown(self) {
        if let Some(remote) = self.remote {
            remote.queue.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests;
