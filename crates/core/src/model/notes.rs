use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::ids::NoteId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NoteError {
    #[error("note text cannot be empty")]
    Empty,

    #[error("unknown note {0}")]
    Unknown(NoteId),
}

/// Wire shape of a single note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(alias = "content")]
    pub text: String,
}

/// A note as the backend may send it: a full record, or bare text that gets
/// an id on arrival.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireNote {
    Record(Note),
    Text(String),
}

impl From<WireNote> for Note {
    fn from(wire: WireNote) -> Self {
        match wire {
            WireNote::Record(note) => note,
            WireNote::Text(text) => Note {
                id: NoteId::generate(),
                text,
            },
        }
    }
}

/// User notes addressed by stable id, with a separate display order.
///
/// Positional access (`id_at`, `remove_at`) resolves the index to an id first,
/// so edits never act on whichever note happens to occupy a slot afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WireNote>", into = "Vec<Note>")]
pub struct Notes {
    order: Vec<NoteId>,
    entries: HashMap<NoteId, String>,
}

impl Notes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a note and returns its freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::Empty` for blank text.
    pub fn push(&mut self, text: impl Into<String>) -> Result<NoteId, NoteError> {
        let id = NoteId::generate();
        self.insert(Note {
            id,
            text: text.into(),
        })?;
        Ok(id)
    }

    /// Appends a note with a known id, or replaces its text if already present.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::Empty` for blank text.
    pub fn insert(&mut self, note: Note) -> Result<(), NoteError> {
        if note.text.trim().is_empty() {
            return Err(NoteError::Empty);
        }
        self.store(note);
        Ok(())
    }

    fn store(&mut self, note: Note) {
        if self.entries.insert(note.id, note.text).is_none() {
            self.order.push(note.id);
        }
    }

    /// # Errors
    ///
    /// Returns `NoteError::Unknown` if the id is absent, `NoteError::Empty` for blank text.
    pub fn update(&mut self, id: NoteId, text: impl Into<String>) -> Result<(), NoteError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(NoteError::Empty);
        }
        let slot = self.entries.get_mut(&id).ok_or(NoteError::Unknown(id))?;
        *slot = text;
        Ok(())
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let text = self.entries.remove(&id)?;
        self.order.retain(|o| *o != id);
        Some(Note { id, text })
    }

    /// Removes the note currently displayed at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Note> {
        let id = self.id_at(index)?;
        self.remove(id)
    }

    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<NoteId> {
        self.order.get(index).copied()
    }

    #[must_use]
    pub fn get(&self, id: NoteId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Notes in display order.
    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &str)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|text| (*id, text.as_str())))
    }

    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.iter().map(|(_, text)| text).collect()
    }
}

impl From<Vec<WireNote>> for Notes {
    fn from(notes: Vec<WireNote>) -> Self {
        let mut out = Self::default();
        // The backend list is authoritative, blank entries included, so
        // positions line up with what the server holds.
        for note in notes {
            out.store(note.into());
        }
        out
    }
}

impl From<Notes> for Vec<Note> {
    fn from(notes: Notes) -> Self {
        let Notes { order, mut entries } = notes;
        order
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|text| Note { id, text }))
            .collect()
    }
}
