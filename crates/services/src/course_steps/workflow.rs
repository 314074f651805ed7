use std::sync::Arc;

use learnaid_core::model::{CourseId, CourseSteps, UserId};

use super::store::CourseStepStore;
use crate::error::CourseStepError;
use crate::remote::{CourseApi, ProgressApi};

/// Drives a `CourseStepStore` against the remote course and progress seams.
#[derive(Clone)]
pub struct CourseStepService {
    courses: Arc<dyn CourseApi>,
    progress: Arc<dyn ProgressApi>,
    user_id: UserId,
}

impl CourseStepService {
    #[must_use]
    pub fn new(
        courses: Arc<dyn CourseApi>,
        progress: Arc<dyn ProgressApi>,
        user_id: UserId,
    ) -> Self {
        Self {
            courses,
            progress,
            user_id,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Fetches and validates the steps of a course without touching any store.
    ///
    /// # Errors
    ///
    /// Returns `CourseStepError::Api` on transport failure and
    /// `CourseStepError::InvalidSteps` when the backend sends a malformed course.
    pub async fn fetch_steps(&self, course_id: &CourseId) -> Result<CourseSteps, CourseStepError> {
        let steps = self.courses.course_steps(course_id).await?;
        Ok(CourseSteps::new(steps)?)
    }

    /// Loads a course into `store`, then restores the last recorded position.
    ///
    /// Returns `Ok(false)` if the store moved on (another load or a reset)
    /// before the steps arrived. A failed position lookup leaves the learner
    /// on the first step.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording it on the store.
    pub async fn load(
        &self,
        store: &mut CourseStepStore,
        course_id: &CourseId,
    ) -> Result<bool, CourseStepError> {
        let ticket = store.begin_load(course_id.clone());
        tracing::debug!(course_id = %course_id, "loading course steps");

        let steps = match self.fetch_steps(course_id).await {
            Ok(steps) => steps,
            Err(err) => {
                tracing::warn!(course_id = %course_id, error = %err, "course steps failed to load");
                store.fail_load(ticket, err.to_string());
                return Err(err);
            }
        };

        if !store.apply_steps(ticket, steps) {
            tracing::debug!(course_id = %course_id, "discarding stale course steps");
            return Ok(false);
        }

        match self.progress.fetch_progress(&self.user_id, course_id).await {
            Ok(snapshot) => {
                if let Some(last) = snapshot.last_module_id {
                    if !store.restore_position(ticket, &last) {
                        tracing::debug!(module_id = %last, "recorded position not restored");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(course_id = %course_id, error = %err, "could not restore course position");
            }
        }
        Ok(true)
    }

    /// Sends the current position to the backend.
    ///
    /// Navigation is never rolled back; a failure is logged and returned for
    /// the caller to ignore or surface.
    ///
    /// # Errors
    ///
    /// Returns `CourseStepError::NotLoaded` on an empty store and
    /// `CourseStepError::Api` if the save fails.
    pub async fn persist_progress(&self, store: &CourseStepStore) -> Result<(), CourseStepError> {
        let (Some(course_id), Some(update)) = (store.course_id(), store.progress_update()) else {
            return Err(CourseStepError::NotLoaded);
        };

        if let Err(err) = self
            .progress
            .save_progress(&self.user_id, course_id, &update)
            .await
        {
            tracing::warn!(course_id = %course_id, error = %err, "progress save failed");
            return Err(err.into());
        }
        tracing::debug!(
            course_id = %course_id,
            current = %update.current_module_id,
            completed = update.completed_module_ids.len(),
            "progress saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryBackend;
    use learnaid_core::model::{CourseListItem, ProgressSnapshot, Step, StepId};

    fn course() -> CourseId {
        CourseId::new("cpr")
    }

    fn learner() -> UserId {
        UserId::new("u1")
    }

    fn backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.add_course(
            CourseListItem {
                id: course(),
                title: "CPR".into(),
                description: String::new(),
                icon: None,
            },
            vec![
                Step::info("intro", "Intro", "Hands-only CPR."),
                Step::multiple_choice("rate", "Compression rate?", &["60", "110"], "110"),
                Step::finish("done", "Done"),
            ],
        );
        backend
    }

    fn service(backend: &InMemoryBackend) -> CourseStepService {
        let shared = Arc::new(backend.clone());
        CourseStepService::new(shared.clone(), shared, learner())
    }

    #[tokio::test]
    async fn load_restores_last_recorded_step() {
        let backend = backend();
        backend.set_progress(
            &learner(),
            &course(),
            ProgressSnapshot {
                last_module_id: Some(StepId::new("rate")),
                ..ProgressSnapshot::empty()
            },
        );
        let mut store = CourseStepStore::new();

        assert!(service(&backend).load(&mut store, &course()).await.unwrap());
        assert_eq!(store.current_index(), 1);
    }

    #[tokio::test]
    async fn load_without_progress_starts_at_first_step() {
        let backend = backend();
        let mut store = CourseStepStore::new();
        service(&backend).load(&mut store, &course()).await.unwrap();
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.steps().len(), 3);
    }

    #[tokio::test]
    async fn failed_load_sets_store_error() {
        let backend = backend();
        backend.set_offline(true);
        let mut store = CourseStepStore::new();

        let err = service(&backend)
            .load(&mut store, &course())
            .await
            .unwrap_err();
        assert!(matches!(err, CourseStepError::Api(_)));
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn failed_save_keeps_navigation() {
        let backend = backend();
        let svc = service(&backend);
        let mut store = CourseStepStore::new();
        svc.load(&mut store, &course()).await.unwrap();
        store.advance();

        backend.set_offline(true);
        assert!(svc.persist_progress(&store).await.is_err());
        assert_eq!(store.current_index(), 1);

        backend.set_offline(false);
        svc.persist_progress(&store).await.unwrap();
        let (_, update) = backend.saved_updates().pop().unwrap();
        assert_eq!(update.completed_module_ids, vec![StepId::new("intro")]);
    }
}
