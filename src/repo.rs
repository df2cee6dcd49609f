//! Note repository: CRUD over the single serialized collection.
//!
//! Every mutation is a whole-collection read-modify-write under one key. That
//! costs O(total notes) I/O per edit but keeps the persisted shape trivially
//! consistent: a reader can never observe a half-applied collection. The
//! flip side is last-writer-wins when two read-modify-write cycles overlap
//! (see the interleaving test in `tests/notes_repo.rs`); that trade-off is
//! part of the contract, not an accident.

use std::collections::HashMap;
use tracing::warn;

use crate::model::Note;
use crate::store::Storage;

/// The storage key holding the entire ordered notes collection.
pub const NOTES_KEY: &str = "notes";

/// CRUD operations over the notes collection, persisted on the content
/// class. Failure never escapes as an error: callers get `None`/`false` and
/// the persisted collection is left exactly as it was.
pub struct NoteRepository {
    storage: Storage,
}

impl NoteRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All notes, newest-created first. An absent or malformed collection
    /// degrades to empty rather than failing.
    pub async fn list(&self) -> Vec<Note> {
        let mut found = self.storage.content().get(&[NOTES_KEY]).await;
        let Some(value) = found.remove(NOTES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_value(value) {
            Ok(notes) => notes,
            Err(err) => {
                warn!(%err, "notes collection malformed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self, notes: &[Note]) -> bool {
        let value = match serde_json::to_value(notes) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "notes collection failed to serialize");
                return false;
            }
        };
        match self
            .storage
            .content()
            .set(HashMap::from([(NOTES_KEY.to_string(), value)]))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "notes collection write failed");
                false
            }
        }
    }

    /// Create a note and prepend it to the collection. Returns `None` when
    /// the write fails, in which case nothing was applied.
    pub async fn create(&self, title: Option<&str>) -> Option<Note> {
        let existing = self.list().await;
        let note = Note::new(title);

        let mut updated = Vec::with_capacity(existing.len() + 1);
        updated.push(note.clone());
        updated.extend(existing);

        if self.persist(&updated).await {
            Some(note)
        } else {
            None
        }
    }

    /// Replace a note's content and bump `updated_at`. Returns `false` for
    /// an unknown id or a failed write.
    pub async fn update_content(&self, id: &str, content: &str) -> bool {
        let mut notes = self.list().await;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        note.content = content.to_string();
        note.updated_at = chrono::Utc::now().timestamp_millis();
        self.persist(&notes).await
    }

    /// Replace a note's title and bump `updated_at`. Returns `false` for an
    /// unknown id or a failed write.
    pub async fn update_title(&self, id: &str, title: &str) -> bool {
        let mut notes = self.list().await;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        note.title = title.to_string();
        note.updated_at = chrono::Utc::now().timestamp_millis();
        self.persist(&notes).await
    }

    /// Remove a note. Deleting an id that is not present still returns
    /// `true`: the resulting collection state is correct either way.
    pub async fn delete(&self, id: &str) -> bool {
        let mut notes = self.list().await;
        notes.retain(|n| n.id != id);
        self.persist(&notes).await
    }
}
