use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use elegant_core::auth::AuthState;
use elegant_core::config::RemoteConfig;
use elegant_core::models::NoteColor;
use elegant_core::persist::{LocalStateDir, PersistedNotes};
use elegant_core::remote::SupabaseNoteGateway;
use elegant_core::{Note, NoteId, NoteStore};
use serde::Serialize;

use crate::auth::{auth_client, AuthSession};
use crate::config_file::{load_remote_config, resolve_data_dir};
use crate::error::CliError;

/// One CLI invocation's view of local state: the store, where it is
/// persisted, and the remote it mirrors to.
pub struct Workspace {
    pub store: NoteStore,
    pub state_dir: LocalStateDir,
    pub remote: Option<RemoteConfig>,
}

impl Workspace {
    pub const fn new(
        store: NoteStore,
        state_dir: LocalStateDir,
        remote: Option<RemoteConfig>,
    ) -> Self {
        Self {
            store,
            state_dir,
            remote,
        }
    }

    /// Load the snapshot and attach the remote when a session can be restored.
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let state_dir = LocalStateDir::new(resolve_data_dir(data_dir)?);
        let remote = load_remote_config()?;
        let persisted = state_dir.load_notes()?;

        let session = match remote.as_ref() {
            Some(config) => auth_client(config)?.restore_session().await?,
            None => None,
        };
        let store = match (remote.as_ref(), session) {
            (Some(config), Some(session)) => signed_in_store(config, session, persisted)?,
            _ => {
                tracing::debug!("Running in local-only mode");
                NoteStore::local(persisted)
            }
        };

        Ok(Self::new(store, state_dir, remote))
    }

    /// Wait for remote mirrors, then write the snapshot.
    pub async fn close(self) -> Result<(), CliError> {
        self.store.flush().await;
        let snapshot = self.store.persisted_state();
        self.store.shutdown().await;
        self.state_dir.save_notes(&snapshot)?;
        Ok(())
    }
}

fn signed_in_store(
    config: &RemoteConfig,
    session: AuthSession,
    persisted: PersistedNotes,
) -> Result<NoteStore, CliError> {
    let gateway = SupabaseNoteGateway::new(&config.supabase_url, config.supabase_anon_key.clone())?
        .with_access_token(session.access_token);
    tracing::debug!("Mirroring notes for {}", session.user.id);
    Ok(NoteStore::with_remote(
        persisted,
        Arc::new(gateway),
        Arc::new(AuthState::signed_in(session.user)),
    ))
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub tags: Vec<String>,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_slug: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub relative_time: String,
}

/// Resolve an exact id or unique id prefix to a note id
pub fn resolve_note_id(store: &NoteStore, query: &str) -> Result<NoteId, CliError> {
    let query = normalize_note_identifier(query)?;
    store.resolve_id(&query).map_err(|error| match error {
        elegant_core::Error::NotFound(_) => CliError::NoteNotFound(query.clone()),
        elegant_core::Error::InvalidInput(_) => {
            let options = store
                .notes()
                .iter()
                .filter(|note| note.id.as_str().starts_with(&query))
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");
            CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            ))
        }
        other => CliError::Core(other),
    })
}

pub fn resolve_note(store: &NoteStore, query: &str) -> Result<Note, CliError> {
    let id = resolve_note_id(store, query)?;
    store
        .note(&id)
        .ok_or_else(|| CliError::NoteNotFound(query.to_string()))
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id);
            let marker = if note.is_pinned { '*' } else { ' ' };
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.updated_at.timestamp_millis(), now_ms);
            let tags = render_tags(note);

            if tags.is_empty() {
                format!("{short_id:<13} {marker} {preview:<40}  {relative_time}")
            } else {
                format!("{short_id:<13} {marker} {preview:<40}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        tags: note.tags.clone(),
        color: note.color,
        is_pinned: note.is_pinned,
        is_archived: note.is_archived,
        is_public: note.is_public,
        public_slug: note.public_slug.clone(),
        created_at: note.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        updated_at: note.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        relative_time: format_relative_time(note.updated_at.timestamp_millis(), now_ms),
    }
}

/// Title (or first content line) collapsed to one line and truncated
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let title = note.display_title(usize::MAX);
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn render_tags(note: &Note) -> String {
    note.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("elegant-note-{}-{now}.md", std::process::id()))
}
