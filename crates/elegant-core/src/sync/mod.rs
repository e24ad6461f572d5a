//! One-time migration of local notes into a signed-in account, followed by a
//! full refresh from the remote store.

use crate::error::Result;
use crate::persist::LocalStateDir;
use crate::remote::NoteDraft;
use crate::store::NoteStore;

/// Outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// A user was signed in and a remote was configured
    pub authenticated: bool,
    /// Notes in the local collection after the last successful fetch
    pub fetched: usize,
    pub uploaded: usize,
    pub failed: usize,
    /// Local notes were already migrated for this owner
    pub skipped_upload: bool,
}

/// Pulls the signed-in user's notes and uploads local-only notes once per
/// owner, guarded by the marker file in the local state directory.
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    state_dir: LocalStateDir,
}

impl SyncCoordinator {
    #[must_use]
    pub const fn new(state_dir: LocalStateDir) -> Self {
        Self { state_dir }
    }

    /// Run one sync pass against `store`.
    ///
    /// A failed initial fetch aborts the run before anything is uploaded.
    /// Individual upload failures are counted and logged, and the owner is
    /// still marked as migrated.
    pub async fn run(&self, store: &NoteStore) -> Result<SyncReport> {
        let (Some(owner), Some(gateway)) = (store.current_user(), store.gateway()) else {
            tracing::debug!("Skipping sync: no signed-in user or remote");
            return Ok(SyncReport::default());
        };
        let mut report = SyncReport {
            authenticated: true,
            ..SyncReport::default()
        };

        // Pending creates must land before local-only notes are snapshotted.
        store.flush().await;

        let mut markers = self.state_dir.load_sync_markers()?;
        report.skipped_upload = markers.is_migrated(&owner);
        let pending = if report.skipped_upload {
            Vec::new()
        } else {
            store.local_only_notes()
        };

        report.fetched = store.fetch_remote().await?.unwrap_or_default();

        for note in &pending {
            match gateway.create(&NoteDraft::from(note), &owner).await {
                Ok(remote) => {
                    tracing::debug!("Uploaded local note {} as {}", note.id, remote.id);
                    report.uploaded += 1;
                }
                Err(error) => {
                    tracing::warn!("Failed to upload local note {}: {}", note.id, error);
                    report.failed += 1;
                }
            }
        }

        if !report.skipped_upload {
            markers.mark_migrated(&owner);
            self.state_dir.save_sync_markers(&markers)?;
            tracing::info!(
                "Migrated {} local notes for {} ({} failed)",
                report.uploaded,
                owner,
                report.failed
            );
        }

        if report.uploaded > 0 {
            match store.fetch_remote().await {
                Ok(count) => report.fetched = count.unwrap_or_default(),
                Err(error) => tracing::warn!("Failed to refetch after upload: {}", error),
            }
        }

        tracing::info!("Sync finished with {} notes", report.fetched);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::{AuthState, AuthUser};
    use crate::models::{Note, NoteId, NotePatch};
    use crate::persist::PersistedNotes;
    use crate::remote::{InMemoryNoteGateway, NoteGateway};

    fn signed_in() -> AuthState {
        AuthState::signed_in(AuthUser {
            id: "user-1".to_string(),
            email: None,
        })
    }

    fn local_note(title: &str) -> Note {
        let mut note = Note::new();
        note.title = title.to_string();
        note.tags = vec!["offline".to_string()];
        note
    }

    fn setup(
        auth: AuthState,
        local: Vec<Note>,
    ) -> (NoteStore, Arc<InMemoryNoteGateway>, SyncCoordinator, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(InMemoryNoteGateway::new());
        let store = NoteStore::with_remote(
            PersistedNotes {
                notes: local,
                ..PersistedNotes::default()
            },
            gateway.clone(),
            Arc::new(auth),
        );
        let coordinator = SyncCoordinator::new(LocalStateDir::new(temp_dir.path()));
        (store, gateway, coordinator, temp_dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unauthenticated_sync_does_nothing() {
        let (store, gateway, coordinator, _dir) =
            setup(AuthState::anonymous(), vec![local_note("kept")]);

        let report = coordinator.run(&store).await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(store.notes().len(), 1);
        assert!(gateway.all_rows().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_sync_uploads_local_notes_and_folds_in_remote() {
        let (store, gateway, coordinator, _dir) =
            setup(signed_in(), vec![local_note("one"), local_note("two")]);

        let mut phone = Note::new();
        phone.id = NoteId::from("remote-phone");
        phone.title = "From phone".to_string();
        phone.owner_ref = Some("user-1".to_string());
        gateway.insert_row(phone).unwrap();

        let report = coordinator.run(&store).await.unwrap();
        assert!(report.authenticated);
        assert_eq!(report.uploaded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.fetched, 3);
        assert!(!report.skipped_upload);

        let notes = store.notes();
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|note| note.owner_ref.as_deref() == Some("user-1")));
        assert!(store.local_only_notes().is_empty());
        let uploaded = notes.iter().find(|note| note.title == "one").unwrap();
        assert_eq!(uploaded.tags, vec!["offline".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn marker_prevents_second_upload() {
        let (store, gateway, coordinator, _dir) = setup(signed_in(), vec![local_note("one")]);
        coordinator.run(&store).await.unwrap();

        let report = coordinator.run(&store).await.unwrap();
        assert!(report.skipped_upload);
        assert_eq!(report.uploaded, 0);
        assert_eq!(gateway.all_rows().unwrap().len(), 1);
        assert_eq!(store.notes().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_failures_are_counted_and_marker_recorded() {
        let (store, gateway, coordinator, dir) =
            setup(signed_in(), vec![local_note("one"), local_note("two")]);
        gateway.fail_next_creates(1);

        let report = coordinator.run(&store).await.unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fetched, 1);

        let markers = LocalStateDir::new(dir.path()).load_sync_markers().unwrap();
        assert!(markers.is_migrated("user-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_fetch_aborts_before_upload() {
        let (store, gateway, coordinator, dir) = setup(signed_in(), vec![local_note("one")]);
        gateway.set_offline(true);

        assert!(coordinator.run(&store).await.is_err());
        assert_eq!(store.notes().len(), 1);

        let markers = LocalStateDir::new(dir.path()).load_sync_markers().unwrap();
        assert!(!markers.is_migrated("user-1"));

        gateway.set_offline(false);
        let report = coordinator.run(&store).await.unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(gateway.list("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn notes_created_while_signed_in_are_not_uploaded_twice() {
        let (store, gateway, coordinator, _dir) = setup(signed_in(), Vec::new());
        let id = store.create_note();
        store.update_note(&id, NotePatch::title("online"));

        let report = coordinator.run(&store).await.unwrap();
        assert_eq!(report.uploaded, 0);
        assert_eq!(report.fetched, 1);
        assert_eq!(gateway.all_rows().unwrap().len(), 1);
    }
}
