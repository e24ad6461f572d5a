//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::color::NoteColor;
use super::tag::normalize_tag;
use crate::util::random_base36;

const LOCAL_ID_PREFIX: &str = "note_";
const COPY_SUFFIX: &str = " (copy)";

/// Opaque note identifier.
///
/// Notes created on this device get a local id (`note_<millis>_<suffix>`)
/// until the remote store assigns its own identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh local id from the current time and a random suffix
    #[must_use]
    pub fn generate() -> Self {
        Self(format!(
            "{LOCAL_ID_PREFIX}{}_{}",
            Utc::now().timestamp_millis(),
            random_base36(9)
        ))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id was generated locally and never replaced by a remote one
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Normalized tags in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub color: NoteColor,
    /// Remote owner, set once the note is known to the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    /// Assigned the first time the note is shared and kept afterwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_slug: Option<String>,
}

impl Note {
    /// Create an empty note with a fresh local id
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::generate(),
            title: String::new(),
            content: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            is_pinned: false,
            is_archived: false,
            color: NoteColor::Default,
            owner_ref: None,
            is_public: false,
            public_slug: None,
        }
    }

    /// Refresh `updated_at`, never moving it backwards
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(Utc::now());
    }

    /// Copy of this note with a fresh identity, ready to be inserted locally
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::generate(),
            title: format!("{}{COPY_SUFFIX}", self.title),
            created_at: now,
            updated_at: now,
            owner_ref: None,
            is_public: false,
            public_slug: None,
            ..self.clone()
        }
    }

    /// Whether the note contains the tag (expects a normalized tag)
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    /// Whether the note matches a lowercased search query
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self.content.to_lowercase().contains(query)
            || self.tags.iter().any(|tag| tag.contains(query))
    }

    /// Get the title, or the first content line when the title is blank
    #[must_use]
    pub fn display_title(&self, max_len: usize) -> String {
        let source = if self.title.trim().is_empty() {
            self.content.lines().next().unwrap_or("")
        } else {
            self.title.as_str()
        };
        let source = source.trim();
        if source.is_empty() {
            "Untitled".to_string()
        } else {
            source.chars().take(max_len).collect()
        }
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update merged into a note by the store.
///
/// `id` and `created_at` are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
}

impl NotePatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.is_pinned.is_none()
            && self.is_archived.is_none()
            && self.color.is_none()
    }

    /// Same patch with its tag list normalized and deduplicated
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if let Some(tags) = self.tags.take() {
            let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags.iter().filter_map(|tag| normalize_tag(tag)) {
                if !normalized.contains(&tag) {
                    normalized.push(tag);
                }
            }
            self.tags = Some(normalized);
        }
        self
    }

    /// Merge the present fields into `note` (timestamps untouched)
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            note.content.clone_from(content);
        }
        if let Some(tags) = &self.tags {
            note.tags.clone_from(tags);
        }
        if let Some(is_pinned) = self.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(is_archived) = self.is_archived {
            note.is_archived = is_archived;
        }
        if let Some(color) = self.color {
            note.color = color;
        }
    }
}

/// Read-only projection served to unauthenticated viewers of a shared note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub color: NoteColor,
}

impl From<Note> for PublicNote {
    fn from(note: Note) -> Self {
        Self {
            title: note.title,
            content: note.content,
            tags: note.tags,
            created_at: note.created_at,
            color: note.color,
        }
    }
}
