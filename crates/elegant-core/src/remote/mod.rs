//! Remote note gateway
//!
//! The store talks to the remote table only through [`NoteGateway`]. Each
//! implementation owns the mapping between remote rows and [`Note`], so the
//! store never sees remote-shaped data.

mod memory;
mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Note, NoteColor, NoteId, NotePatch};

pub use memory::InMemoryNoteGateway;
pub use supabase::SupabaseNoteGateway;

/// CRUD and slug lookup against the remote notes table.
#[async_trait]
pub trait NoteGateway: Send + Sync {
    /// Notes owned by `owner`, most recently updated first
    async fn list(&self, owner: &str) -> Result<Vec<Note>>;

    /// Create a row; the server assigns id and timestamps
    async fn create(&self, draft: &NoteDraft, owner: &str) -> Result<Note>;

    /// Partial update; `Error::NotFound` when no row matches `id`
    async fn update(&self, id: &NoteId, patch: &RemotePatch) -> Result<Note>;

    /// Delete a row; deleting a missing id is not an error
    async fn delete(&self, id: &NoteId) -> Result<()>;

    /// Public note by slug; private notes are reported as not found
    async fn get_by_public_slug(&self, slug: &str) -> Result<Note>;
}

/// Content fields sent when creating a remote row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub color: NoteColor,
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            is_pinned: note.is_pinned,
            is_archived: note.is_archived,
            color: note.color,
        }
    }
}

/// Partial remote update: content fields plus sharing state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePatch {
    pub fields: NotePatch,
    pub is_public: Option<bool>,
    pub public_slug: Option<String>,
}

impl RemotePatch {
    /// Patch carrying only the sharing state
    #[must_use]
    pub fn sharing(is_public: bool, public_slug: Option<String>) -> Self {
        Self {
            fields: NotePatch::default(),
            is_public: Some(is_public),
            public_slug,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.is_public.is_none() && self.public_slug.is_none()
    }
}

impl From<NotePatch> for RemotePatch {
    fn from(fields: NotePatch) -> Self {
        Self {
            fields,
            is_public: None,
            public_slug: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_copies_content_fields() {
        let mut note = Note::new();
        note.title = "Plan".to_string();
        note.tags = vec!["work".to_string()];
        note.is_pinned = true;
        note.color = NoteColor::Blue;

        let draft = NoteDraft::from(&note);
        assert_eq!(draft.title, "Plan");
        assert_eq!(draft.tags, vec!["work".to_string()]);
        assert!(draft.is_pinned);
        assert_eq!(draft.color, NoteColor::Blue);
    }

    #[test]
    fn sharing_patch_is_not_empty() {
        assert!(RemotePatch::default().is_empty());
        assert!(!RemotePatch::sharing(false, None).is_empty());
        assert!(!RemotePatch::from(NotePatch::title("x")).is_empty());
    }
}
