//! In-process implementation of the note gateway.
//!
//! Behaves like the remote table (server-assigned ids and timestamps, unique
//! public slugs, public-only slug lookup) without any network. Used as the
//! remote double in tests and for local demos.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{NoteDraft, NoteGateway, RemotePatch};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId};

#[derive(Debug, Default)]
pub struct InMemoryNoteGateway {
    rows: Mutex<Vec<Note>>,
    offline: AtomicBool,
    create_failures: AtomicUsize,
}

impl InMemoryNoteGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row as if it had been written by another device
    pub fn insert_row(&self, note: Note) -> Result<()> {
        self.rows()?.push(note);
        Ok(())
    }

    /// Snapshot of every stored row
    pub fn all_rows(&self) -> Result<Vec<Note>> {
        Ok(self.rows()?.clone())
    }

    /// Fetch one row by id
    pub fn row(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.rows()?.iter().find(|row| &row.id == id).cloned())
    }

    /// Make every call fail with a transport error until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `count` create calls
    pub fn fail_next_creates(&self, count: usize) {
        self.create_failures.store(count, Ordering::SeqCst);
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<Note>>> {
        self.rows
            .lock()
            .map_err(|error| Error::Remote(format!("in-memory table poisoned: {error}")))
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::Remote("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn take_create_failure(&self) -> bool {
        self.create_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl NoteGateway for InMemoryNoteGateway {
    async fn list(&self, owner: &str) -> Result<Vec<Note>> {
        self.ensure_online()?;
        let mut notes: Vec<Note> = self
            .rows()?
            .iter()
            .filter(|row| row.owner_ref.as_deref() == Some(owner))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn create(&self, draft: &NoteDraft, owner: &str) -> Result<Note> {
        self.ensure_online()?;
        if owner.trim().is_empty() {
            return Err(Error::Remote("User not authenticated".to_string()));
        }
        if self.take_create_failure() {
            return Err(Error::Remote("insert rejected".to_string()));
        }

        let now = Utc::now();
        let note = Note {
            id: NoteId::from(Uuid::now_v7().to_string()),
            title: draft.title.clone(),
            content: draft.content.clone(),
            tags: draft.tags.clone(),
            created_at: now,
            updated_at: now,
            is_pinned: draft.is_pinned,
            is_archived: draft.is_archived,
            color: draft.color,
            owner_ref: Some(owner.to_string()),
            is_public: false,
            public_slug: None,
        };
        self.rows()?.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: &NoteId, patch: &RemotePatch) -> Result<Note> {
        self.ensure_online()?;
        let mut rows = self.rows()?;

        if let Some(slug) = patch.public_slug.as_deref() {
            let taken = rows
                .iter()
                .any(|row| &row.id != id && row.public_slug.as_deref() == Some(slug));
            if taken {
                return Err(Error::Remote(format!(
                    "unique constraint violated: public_slug '{slug}' already exists"
                )));
            }
        }

        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.fields.apply_to(row);
        if let Some(is_public) = patch.is_public {
            row.is_public = is_public;
        }
        if let Some(slug) = &patch.public_slug {
            row.public_slug = Some(slug.clone());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        self.ensure_online()?;
        self.rows()?.retain(|row| &row.id != id);
        Ok(())
    }

    async fn get_by_public_slug(&self, slug: &str) -> Result<Note> {
        self.ensure_online()?;
        self.rows()?
            .iter()
            .find(|row| row.is_public && row.public_slug.as_deref() == Some(slug))
            .cloned()
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }
}
