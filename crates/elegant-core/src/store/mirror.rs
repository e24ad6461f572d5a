//! Background mirroring of local mutations to the remote gateway.
//!
//! A single worker task drains an unbounded queue in order, so remote calls
//! for one note never overtake each other. Ids are resolved through the
//! store's alias map when a command is processed, not when it is queued.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{lock, StoreState};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::remote::{NoteDraft, NoteGateway, RemotePatch};

#[derive(Debug)]
pub(crate) enum MirrorCommand {
    Create {
        local_id: NoteId,
        draft: NoteDraft,
        owner: String,
    },
    Update {
        id: NoteId,
        patch: RemotePatch,
    },
    Delete {
        id: NoteId,
    },
    Publish {
        id: NoteId,
        patch: RemotePatch,
        reply: oneshot::Sender<Result<()>>,
    },
    Refresh {
        owner: String,
        reply: oneshot::Sender<Result<usize>>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct MirrorQueue {
    sender: mpsc::UnboundedSender<MirrorCommand>,
    worker: JoinHandle<()>,
}

impl MirrorQueue {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(gateway: Arc<dyn NoteGateway>, state: Arc<Mutex<StoreState>>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(receiver, gateway, state));
        Self { sender, worker }
    }

    pub fn enqueue(&self, command: MirrorCommand) {
        if self.sender.send(command).is_err() {
            tracing::warn!("Mirror worker stopped; dropping remote change");
        }
    }

    pub async fn publish(&self, id: NoteId, patch: RemotePatch) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.enqueue(MirrorCommand::Publish { id, patch, reply });
        response.await.map_err(|_| worker_gone())?
    }

    pub async fn refresh(&self, owner: String) -> Result<usize> {
        let (reply, response) = oneshot::channel();
        self.enqueue(MirrorCommand::Refresh { owner, reply });
        response.await.map_err(|_| worker_gone())?
    }

    /// Wait until everything queued so far has been processed
    pub async fn flush(&self) {
        let (reply, response) = oneshot::channel();
        self.enqueue(MirrorCommand::Flush { reply });
        let _ = response.await;
    }

    /// Drain the queue and stop the worker
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(error) = self.worker.await {
            tracing::error!("Mirror worker panicked: {}", error);
        }
    }
}

fn worker_gone() -> Error {
    Error::Remote("mirror worker stopped".to_string())
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<MirrorCommand>,
    gateway: Arc<dyn NoteGateway>,
    state: Arc<Mutex<StoreState>>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            MirrorCommand::Create {
                local_id,
                draft,
                owner,
            } => create(gateway.as_ref(), &state, &local_id, &draft, &owner).await,
            MirrorCommand::Update { id, patch } => {
                update(gateway.as_ref(), &state, &id, &patch).await;
            }
            MirrorCommand::Delete { id } => delete(gateway.as_ref(), &state, &id).await,
            MirrorCommand::Publish { id, patch, reply } => {
                let id = lock(&state).resolve(&id);
                let result = if id.is_local() {
                    Err(Error::NotFound(format!(
                        "note {id} has not been stored remotely yet"
                    )))
                } else {
                    gateway.update(&id, &patch).await.map(|_| ())
                };
                if let Err(error) = &result {
                    tracing::warn!("Failed to update sharing for note {}: {}", id, error);
                }
                let _ = reply.send(result);
            }
            MirrorCommand::Refresh { owner, reply } => {
                let result = refresh(gateway.as_ref(), &state, &owner).await;
                let _ = reply.send(result);
            }
            MirrorCommand::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }
    tracing::debug!("Mirror worker stopped");
}

async fn create(
    gateway: &dyn NoteGateway,
    state: &Mutex<StoreState>,
    local_id: &NoteId,
    draft: &NoteDraft,
    owner: &str,
) {
    let remote = match gateway.create(draft, owner).await {
        Ok(remote) => remote,
        Err(error) => {
            tracing::warn!("Failed to create remote note for {}: {}", local_id, error);
            return;
        }
    };

    let applied = lock(state).apply_remote_identity(local_id, &remote);
    if applied {
        tracing::debug!("Note {} stored remotely as {}", local_id, remote.id);
        return;
    }

    tracing::info!(
        "Note {} was deleted before its remote copy was created; removing {}",
        local_id,
        remote.id
    );
    if let Err(error) = gateway.delete(&remote.id).await {
        tracing::warn!("Failed to remove orphaned remote note {}: {}", remote.id, error);
    }
}

async fn update(
    gateway: &dyn NoteGateway,
    state: &Mutex<StoreState>,
    id: &NoteId,
    patch: &RemotePatch,
) {
    let id = {
        let state = lock(state);
        match state.note(id) {
            Some(note) if note.owner_ref.is_some() => note.id.clone(),
            Some(_) => {
                tracing::debug!("Note {} has no remote copy yet; skipping update", id);
                return;
            }
            None => {
                tracing::debug!("Note {} no longer exists; skipping update", id);
                return;
            }
        }
    };

    if let Err(error) = gateway.update(&id, patch).await {
        tracing::warn!("Failed to update remote note {}: {}", id, error);
    }
}

async fn delete(gateway: &dyn NoteGateway, state: &Mutex<StoreState>, id: &NoteId) {
    let id = lock(state).resolve(id);
    if id.is_local() {
        tracing::debug!("Note {} never reached the remote store; nothing to delete", id);
        return;
    }
    if let Err(error) = gateway.delete(&id).await {
        tracing::warn!("Failed to delete remote note {}: {}", id, error);
    }
}

async fn refresh(gateway: &dyn NoteGateway, state: &Mutex<StoreState>, owner: &str) -> Result<usize> {
    let notes: Vec<Note> = gateway.list(owner).await?;
    let count = notes.len();
    lock(state).replace_notes(notes);
    Ok(count)
}
