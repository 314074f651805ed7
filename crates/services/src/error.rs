//! Shared error types for the services crate.

use thiserror::Error;

use learnaid_core::model::{
    CourseId, NoteError, ProgressError, ScenarioId, StepError, StepId, ValidationError,
};
use storage::bundled::BundledError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures talking to the remote backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the course step store and `CourseStepService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseStepError {
    #[error("no course steps are loaded")]
    NotLoaded,
    #[error("step {0} is not part of the loaded course")]
    StaleReference(StepId),
    #[error("step {0} is not a multiple choice question")]
    NotMultipleChoice(StepId),
    #[error(transparent)]
    InvalidSteps(#[from] StepError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by the scenario quiz store and `ScenarioQuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("cannot start a quiz without scenarios")]
    EmptyQuiz,
    #[error("scenario {0} is not in the active sequence")]
    StaleReference(ScenarioId),
    #[error("scenario {0} is not the current scenario")]
    NotCurrent(ScenarioId),
    #[error(transparent)]
    Bundled(#[from] BundledError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("failed to load progress for course {course_id}")]
    Load {
        course_id: CourseId,
        #[source]
        source: ApiError,
    },
    #[error("no progress loaded for course {0}")]
    NotLoaded(CourseId),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error("no note at position {0}")]
    NoteIndexOutOfRange(usize),
    #[error("feedback cannot be empty")]
    EmptyFeedback,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored user record is unreadable: {0}")]
    CorruptUser(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
