//! Read-only lookup of publicly shared notes.

use crate::error::{Error, Result};
use crate::models::PublicNote;
use crate::remote::NoteGateway;

/// Fetch the public projection of a shared note.
///
/// Needs no signed-in user. A private or unknown slug is `Error::NotFound`.
pub async fn fetch_public_note(gateway: &dyn NoteGateway, slug: &str) -> Result<PublicNote> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(Error::InvalidInput("Share slug must not be empty".to_string()));
    }
    let note = gateway.get_by_public_slug(slug).await?;
    Ok(PublicNote::from(note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotePatch;
    use crate::remote::{InMemoryNoteGateway, NoteDraft, RemotePatch};

    #[tokio::test(flavor = "multi_thread")]
    async fn public_note_is_visible_by_slug() {
        let gateway = InMemoryNoteGateway::new();
        let draft = NoteDraft {
            title: "Recipe".to_string(),
            content: "Flour, water".to_string(),
            tags: vec!["food".to_string()],
            ..NoteDraft::default()
        };
        let note = gateway.create(&draft, "user-1").await.unwrap();
        gateway
            .update(
                &note.id,
                &RemotePatch::sharing(true, Some("k3j9x0ab".to_string())),
            )
            .await
            .unwrap();

        let public = fetch_public_note(&gateway, " k3j9x0ab ").await.unwrap();
        assert_eq!(public.title, "Recipe");
        assert_eq!(public.tags, vec!["food".to_string()]);
        assert_eq!(public.created_at, note.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn private_or_unknown_slug_is_not_found() {
        let gateway = InMemoryNoteGateway::new();
        let note = gateway
            .create(&NoteDraft::default(), "user-1")
            .await
            .unwrap();
        gateway
            .update(
                &note.id,
                &RemotePatch {
                    fields: NotePatch::title("hidden"),
                    is_public: Some(false),
                    public_slug: Some("hidden01".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(fetch_public_note(&gateway, "hidden01")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(fetch_public_note(&gateway, "missing0")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            fetch_public_note(&gateway, "  ").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
