//! Note export as JSON or Markdown with front-matter.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{Note, NoteColor};

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(Error::InvalidInput(format!(
                "Unknown export format '{other}' (expected json or markdown)"
            ))),
        }
    }
}

/// Serializable note representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a note into an export record with stable tag ordering.
#[must_use]
pub fn note_to_export_item(note: &Note) -> ExportNote {
    let mut tags = note.tags.clone();
    tags.sort();

    ExportNote {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        tags,
        color: note.color,
        is_pinned: note.is_pinned,
        is_archived: note.is_archived,
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

/// Render notes as pretty-printed JSON.
pub fn render_json_export(notes: &[Note]) -> serde_json::Result<String> {
    let items = notes
        .iter()
        .map(note_to_export_item)
        .collect::<Vec<ExportNote>>();
    serde_json::to_string_pretty(&items)
}

/// Render notes in Markdown with frontmatter blocks.
#[must_use]
pub fn render_markdown_export(notes: &[Note]) -> String {
    let mut output = String::new();

    for (index, note) in notes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let export_note = note_to_export_item(note);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", export_note.id);
        let _ = writeln!(output, "title: {}", yaml_string(&export_note.title));
        let _ = writeln!(output, "color: {}", export_note.color);
        let _ = writeln!(output, "pinned: {}", export_note.is_pinned);
        let _ = writeln!(output, "archived: {}", export_note.is_archived);
        let _ = writeln!(output, "created_at: {}", timestamp(export_note.created_at));
        let _ = writeln!(output, "updated_at: {}", timestamp(export_note.updated_at));
        if export_note.tags.is_empty() {
            let _ = writeln!(output, "tags: []");
        } else {
            let _ = writeln!(output, "tags:");
            for tag in export_note.tags {
                let _ = writeln!(output, "  - {tag}");
            }
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(&export_note.content);
        output.push('\n');
    }

    output
}

/// Render notes based on selected export format.
pub fn render_notes_export(notes: &[Note], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(notes),
        ExportFormat::Markdown => Ok(render_markdown_export(notes)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("elegant-export-{timestamp_ms}.{}", format.extension())
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
