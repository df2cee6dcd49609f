//! Session synchronization: the layer a panel UI binds to.
//!
//! [`NoteSession`] owns three pieces of observable state — the mirrored
//! `notes` list, the transient `current_note` selection, and the
//! `storage_error` flag — and keeps them consistent with the repository
//! after every mutation. The state machine follows one rule everywhere:
//! on a failed write, the last known-good state stays visible and only the
//! error flag moves.
//!
//! Autosave is a trailing debounce: every buffer change cancels the pending
//! write and arms a new one, so a burst of edits costs exactly one write,
//! carrying the last buffer. The write targets whichever note is selected
//! at the moment the timer fires.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::migrate::migrate_legacy;
use crate::model::Note;
use crate::repo::NoteRepository;
use crate::store::{Storage, StorageBackend};

/// Key holding the pre-collection single editor document. Read once at
/// startup, then cleared.
pub const EDITOR_CONTENT_KEY: &str = "editor-content";

/// Title given to the note synthesized from the legacy editor document.
pub const LEGACY_IMPORT_TITLE: &str = "previous memo";

/// Quiet period before an in-progress edit is persisted.
pub const DEFAULT_AUTOSAVE_QUIET: Duration = Duration::from_millis(230);

/// Cancelable trailing-debounce scheduler.
///
/// `schedule` aborts whatever is pending and arms a fresh timer, so within a
/// burst only the last task ever runs, one quiet period after the burst
/// ends. Cancellation reaches only the armed timer: once the quiet period
/// has elapsed the task is detached and runs to completion, so an in-flight
/// storage write is never killed halfway. Requires a tokio runtime.
pub struct Debouncer {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // The quiet period elapsed: detach the task so a later cancel
            // or reschedule can no longer reach it mid-write.
            tokio::spawn(task);
        }));
    }

    /// Drop the pending task, if any, without running it. Only an unfired
    /// timer can be dropped; a task past its quiet period runs to
    /// completion.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Default)]
struct SessionState {
    notes: Vec<Note>,
    current: Option<Note>,
    storage_error: bool,
}

/// Reactive view over the note repository.
pub struct NoteSession {
    repo: Arc<NoteRepository>,
    storage: Storage,
    state: Arc<Mutex<SessionState>>,
    autosave: Mutex<Debouncer>,
}

impl NoteSession {
    pub fn new(storage: Storage) -> Self {
        Self::with_autosave_quiet(storage, DEFAULT_AUTOSAVE_QUIET)
    }

    pub fn with_autosave_quiet(storage: Storage, quiet: Duration) -> Self {
        Self {
            repo: Arc::new(NoteRepository::new(storage.clone())),
            storage,
            state: Arc::new(Mutex::new(SessionState::default())),
            autosave: Mutex::new(Debouncer::new(quiet)),
        }
    }

    /// Load the notes list and, once only, upgrade the legacy single editor
    /// document into a note of its own: when `editor-content` holds text and
    /// the collection is empty, a note titled [`LEGACY_IMPORT_TITLE`] is
    /// created from it and the key is cleared.
    pub async fn init(&self) {
        let notes = self.repo.list().await;
        self.state.lock().await.notes = notes.clone();

        let saved = self
            .storage
            .content()
            .get(&[EDITOR_CONTENT_KEY])
            .await
            .remove(EDITOR_CONTENT_KEY)
            .and_then(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .unwrap_or_default();

        if !saved.is_empty() && notes.is_empty() {
            if let Some(note) = self.repo.create(Some(LEGACY_IMPORT_TITLE)).await {
                if !self.repo.update_content(&note.id, &saved).await {
                    warn!("legacy editor document import did not persist");
                }
                self.refresh_notes().await;
            }
            // Cleared by writing empty, which is what readers of this key
            // have always treated as "nothing saved".
            if let Err(err) = self
                .storage
                .content()
                .set(HashMap::from([(
                    EDITOR_CONTENT_KEY.to_string(),
                    Value::String(String::new()),
                )]))
                .await
            {
                warn!(%err, "failed to clear legacy editor document");
            }
        }
    }

    /// [`init`](Self::init), preceded by draining the retired flat store.
    pub async fn init_with_legacy(&self, legacy: &dyn StorageBackend) {
        migrate_legacy(legacy, &self.storage).await;
        self.init().await;
    }

    async fn refresh_notes(&self) {
        let notes = self.repo.list().await;
        self.state.lock().await.notes = notes;
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.state.lock().await.notes.clone()
    }

    pub async fn current_note(&self) -> Option<Note> {
        self.state.lock().await.current.clone()
    }

    pub async fn storage_error(&self) -> bool {
        self.state.lock().await.storage_error
    }

    pub async fn dismiss_storage_error(&self) {
        self.state.lock().await.storage_error = false;
    }

    /// Create a note and refresh the list. On failure nothing else moves:
    /// the selection is untouched and only the error flag is raised.
    pub async fn create_note(&self, title: Option<&str>) -> Option<Note> {
        match self.repo.create(title).await {
            Some(note) => {
                self.refresh_notes().await;
                Some(note)
            }
            None => {
                warn!("note creation failed; storage may be full");
                self.state.lock().await.storage_error = true;
                None
            }
        }
    }

    /// Persist new content for a note. The error flag always tracks the
    /// outcome of the latest content write; the list refreshes only on
    /// success, leaving the previous known-good state visible otherwise.
    pub async fn update_note(&self, id: &str, content: &str) -> bool {
        let ok = self.repo.update_content(id, content).await;
        self.state.lock().await.storage_error = !ok;
        if ok {
            self.refresh_notes().await;
        } else {
            warn!(id, "note save failed; keeping previous contents visible");
        }
        ok
    }

    /// Persist a new title. On success the current selection's title is
    /// patched in place so the UI never flashes the stale one.
    pub async fn update_note_title(&self, id: &str, title: &str) -> bool {
        let ok = self.repo.update_title(id, title).await;
        if ok {
            self.refresh_notes().await;
            let mut state = self.state.lock().await;
            if let Some(current) = state.current.as_mut() {
                if current.id == id {
                    current.title = title.to_string();
                }
            }
        } else {
            warn!(id, "title save failed");
            self.state.lock().await.storage_error = true;
        }
        ok
    }

    /// Delete a note; clears the selection when it pointed at the deleted
    /// note, so no dangling reference survives.
    pub async fn delete_note(&self, id: &str) -> bool {
        let ok = self.repo.delete(id).await;
        if ok {
            self.refresh_notes().await;
            let mut state = self.state.lock().await;
            if state.current.as_ref().is_some_and(|n| n.id == id) {
                state.current = None;
            }
        }
        ok
    }

    pub async fn select_note(&self, note: Note) {
        self.state.lock().await.current = Some(note);
    }

    pub async fn clear_current_note(&self) {
        self.state.lock().await.current = None;
    }

    /// The editor buffer changed: arm (or re-arm) the autosave timer. When
    /// it fires, the buffer is written to whichever note is selected at that
    /// moment; with nothing selected the write is skipped.
    pub async fn buffer_changed(&self, content: String) {
        let repo = Arc::clone(&self.repo);
        let state = Arc::clone(&self.state);
        self.autosave.lock().await.schedule(async move {
            let target = state.lock().await.current.as_ref().map(|n| n.id.clone());
            let Some(id) = target else {
                return;
            };
            let ok = repo.update_content(&id, &content).await;
            state.lock().await.storage_error = !ok;
            if ok {
                let notes = repo.list().await;
                state.lock().await.notes = notes;
            }
        });
    }

    /// Drop a pending autosave without writing (panel closing, note switch
    /// where the buffer must not carry over). A write whose timer already
    /// fired is not cancelable and completes normally.
    pub async fn cancel_autosave(&self) {
        self.autosave.lock().await.cancel();
    }
}
