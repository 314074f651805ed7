use std::sync::Arc;

use learnaid_core::model::{
    Confidence, CourseId, ModuleId, Note, NoteError, NoteId, Notes, ProgressError,
    ProgressSnapshot, UserId,
};
use learnaid_core::quotes;
use rand::Rng;

use super::board::{ProgressBoard, RequestStatus};
use crate::error::ProgressServiceError;
use crate::remote::{ProgressApi, Reflection};

/// Fetches progress snapshots and edits notes, reflections and feedback.
///
/// Writes go to the backend first and are mirrored into the board only once
/// the backend accepted them.
#[derive(Clone)]
pub struct ProgressService {
    progress: Arc<dyn ProgressApi>,
    user_id: UserId,
}

impl ProgressService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressApi>, user_id: UserId) -> Self {
        Self { progress, user_id }
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Load` naming the course on any remote failure.
    pub async fn fetch(&self, course_id: &CourseId) -> Result<ProgressSnapshot, ProgressServiceError> {
        self.progress
            .fetch_progress(&self.user_id, course_id)
            .await
            .map_err(|source| ProgressServiceError::Load {
                course_id: course_id.clone(),
                source,
            })
    }

    /// Re-fetches a course into the board.
    ///
    /// On failure the board shows `ProgressSnapshot::empty()` for the course
    /// and the error is still returned.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Load` if the fetch fails.
    pub async fn refresh(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
    ) -> Result<(), ProgressServiceError> {
        let ticket = board.begin_fetch(course_id);
        match self.fetch(course_id).await {
            Ok(snapshot) => {
                if !board.apply_snapshot(course_id, ticket, snapshot) {
                    tracing::debug!(course_id = %course_id, "discarding stale progress");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(course_id = %course_id, error = %err, "progress unavailable, showing empty snapshot");
                board.fail_fetch(course_id, ticket, err.to_string());
                Err(err)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `NotLoaded` before a refresh, `Note` for blank text, `Api` on remote failure.
    pub async fn add_note(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        text: &str,
    ) -> Result<NoteId, ProgressServiceError> {
        loaded(board, course_id)?;
        if text.trim().is_empty() {
            return Err(NoteError::Empty.into());
        }
        let note = Note {
            id: NoteId::generate(),
            text: text.to_owned(),
        };

        self.progress
            .add_note(&self.user_id, course_id, &note)
            .await?;
        let id = note.id;
        loaded_mut(board, course_id)?.notes.insert(note)?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `Note` for an unknown id or blank text, `Api` on remote failure.
    pub async fn update_note(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        note_id: NoteId,
        text: &str,
    ) -> Result<(), ProgressServiceError> {
        if loaded(board, course_id)?.notes.get(note_id).is_none() {
            return Err(NoteError::Unknown(note_id).into());
        }
        if text.trim().is_empty() {
            return Err(NoteError::Empty.into());
        }

        let note = Note {
            id: note_id,
            text: text.to_owned(),
        };
        self.progress.update_note(&self.user_id, &note).await?;
        loaded_mut(board, course_id)?
            .notes
            .update(note_id, note.text)?;
        Ok(())
    }

    /// Replaces the whole note list of a course. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` before a refresh and `Api` on remote failure.
    pub async fn update_notes(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        notes: Notes,
    ) -> Result<(), ProgressServiceError> {
        loaded(board, course_id)?;
        self.progress
            .replace_notes(&self.user_id, course_id, &notes)
            .await?;
        loaded_mut(board, course_id)?.notes = notes;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Note` for an unknown id and `Api` on remote failure.
    pub async fn delete_note(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        note_id: NoteId,
    ) -> Result<(), ProgressServiceError> {
        if loaded(board, course_id)?.notes.get(note_id).is_none() {
            return Err(NoteError::Unknown(note_id).into());
        }
        self.progress.delete_note(&self.user_id, note_id).await?;
        loaded_mut(board, course_id)?
            .notes
            .remove(note_id);
        Ok(())
    }

    /// Deletes the note shown at `index`, resolved to its id before any I/O.
    ///
    /// # Errors
    ///
    /// Returns `NoteIndexOutOfRange` for a bad position, otherwise as `delete_note`.
    pub async fn delete_note_at(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        index: usize,
    ) -> Result<NoteId, ProgressServiceError> {
        let note_id = loaded(board, course_id)?
            .notes
            .id_at(index)
            .ok_or(ProgressServiceError::NoteIndexOutOfRange(index))?;
        self.delete_note(board, course_id, note_id).await?;
        Ok(note_id)
    }

    /// Upserts a reflection and confidence rating on a module.
    ///
    /// # Errors
    ///
    /// Returns `Progress` for blank text or an unknown module, `Api` on remote failure.
    pub async fn save_reflection(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        module_id: &ModuleId,
        text: &str,
        confidence: Confidence,
    ) -> Result<(), ProgressServiceError> {
        let known = loaded(board, course_id)?.module(module_id).is_some();
        if text.trim().is_empty() {
            return Err(ProgressError::EmptyReflection.into());
        }
        if !known {
            return Err(ProgressError::UnknownModule(module_id.clone()).into());
        }

        board.set_reflection_status(RequestStatus::Pending);
        let reflection = Reflection {
            module_id: module_id.clone(),
            reflection: text.to_owned(),
            confidence,
        };
        if let Err(err) = self
            .progress
            .save_reflection(&self.user_id, course_id, &reflection)
            .await
        {
            tracing::warn!(course_id = %course_id, module_id = %module_id, error = %err, "reflection save failed");
            board.set_reflection_status(RequestStatus::Failed);
            return Err(err.into());
        }

        board.set_reflection_status(RequestStatus::Succeeded);
        loaded_mut(board, course_id)?.upsert_reflection(
            module_id,
            reflection.reflection,
            confidence,
        )?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `EmptyFeedback` for blank text and `Api` on remote failure.
    pub async fn send_feedback(
        &self,
        board: &mut ProgressBoard,
        course_id: &CourseId,
        text: &str,
    ) -> Result<(), ProgressServiceError> {
        if text.trim().is_empty() {
            return Err(ProgressServiceError::EmptyFeedback);
        }
        board.set_feedback_status(RequestStatus::Pending);
        match self
            .progress
            .send_feedback(&self.user_id, course_id, text.trim())
            .await
        {
            Ok(()) => {
                board.set_feedback_status(RequestStatus::Succeeded);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(course_id = %course_id, error = %err, "feedback not sent");
                board.set_feedback_status(RequestStatus::Failed);
                Err(err.into())
            }
        }
    }

    /// Picks a quote for the dashboard header and keeps it on the board.
    pub fn motivational_quote<R: Rng + ?Sized>(
        &self,
        board: &mut ProgressBoard,
        rng: &mut R,
    ) -> &'static str {
        let quote = quotes::pick(rng);
        board.set_quote(quote);
        quote
    }
}

fn loaded<'a>(
    board: &'a ProgressBoard,
    course_id: &CourseId,
) -> Result<&'a ProgressSnapshot, ProgressServiceError> {
    board
        .snapshot(course_id)
        .ok_or_else(|| ProgressServiceError::NotLoaded(course_id.clone()))
}

fn loaded_mut<'a>(
    board: &'a mut ProgressBoard,
    course_id: &CourseId,
) -> Result<&'a mut ProgressSnapshot, ProgressServiceError> {
    board
        .snapshot_mut(course_id)
        .ok_or_else(|| ProgressServiceError::NotLoaded(course_id.clone()))
}
