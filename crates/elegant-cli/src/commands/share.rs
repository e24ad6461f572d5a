use elegant_core::config::RemoteConfig;
use elegant_core::remote::SupabaseNoteGateway;
use elegant_core::share::fetch_public_note;
use elegant_core::{Error, NoteStore};

use crate::commands::common::resolve_note_id;
use crate::error::CliError;

/// Toggle public sharing; requires a signed-in session.
pub async fn run_share(
    store: &NoteStore,
    remote: Option<&RemoteConfig>,
    id: &str,
) -> Result<(), CliError> {
    let id = resolve_note_id(store, id)?;
    // Pending creates must land so the publish targets the remote id.
    store.flush().await;
    let id = store.current_id(&id);

    let share = match store.toggle_public(&id).await {
        Ok(Some(share)) => share,
        Ok(None) => return Err(CliError::NoteNotFound(id.to_string())),
        Err(Error::AuthRequired) => {
            return Err(CliError::Auth(
                "Sign in with `elegant auth login` to share notes".to_string(),
            ))
        }
        Err(error) => return Err(error.into()),
    };

    match (share.is_public, share.public_slug) {
        (true, Some(slug)) => {
            let link = remote.and_then(|config| config.share_url(&slug));
            println!("{id} is public: {}", link.unwrap_or(slug));
        }
        _ => println!("{id} is private"),
    }
    Ok(())
}

/// Print a publicly shared note without signing in.
pub async fn run_view(remote: &RemoteConfig, slug: &str) -> Result<(), CliError> {
    let gateway = SupabaseNoteGateway::new(&remote.supabase_url, remote.supabase_anon_key.clone())?;
    let note = fetch_public_note(&gateway, slug).await.map_err(|error| match error {
        Error::NotFound(_) => CliError::NoteNotFound(slug.trim().to_string()),
        other => CliError::Core(other),
    })?;

    let title = if note.title.trim().is_empty() {
        "Untitled"
    } else {
        note.title.as_str()
    };
    println!("{title}");
    let tags = note
        .tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    if !tags.is_empty() {
        println!("{tags}");
    }
    println!("created: {}", note.created_at.format("%Y-%m-%d"));
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
    Ok(())
}
