//! Seams to the REST backend.
//!
//! Services depend on these traits, never on a concrete client, so tests can
//! swap in `InMemoryBackend` without any process-wide state.

use std::sync::Arc;

use async_trait::async_trait;
use learnaid_core::model::{
    AuthResponse, Confidence, CourseId, CourseListItem, CourseOverview, LoginForm, ModuleId, Note,
    NoteId, Notes, ProgressSnapshot, ProgressUpdate, SignupForm, Step, UserId,
};
use serde::{Deserialize, Serialize};
use storage::repository::SessionRepository;

use crate::config::ApiConfig;
use crate::error::ApiError;

mod http;
mod memory;

pub use http::HttpClient;
pub use memory::InMemoryBackend;

/// Reflection payload attached to a completed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub module_id: ModuleId,
    pub reflection: String,
    pub confidence: Confidence,
}

#[async_trait]
pub trait CourseApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn list_courses(&self) -> Result<Vec<CourseListItem>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn course_overview(&self, course_id: &CourseId) -> Result<CourseOverview, ApiError>;

    /// Ordered steps of a course.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn course_steps(&self, course_id: &CourseId) -> Result<Vec<Step>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn enroll(&self, user_id: &UserId, course_id: &CourseId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn fetch_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressSnapshot, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn save_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn add_note(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        note: &Note,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn update_note(&self, user_id: &UserId, note: &Note) -> Result<(), ApiError>;

    /// Overwrites the whole note list of a course (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn replace_notes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        notes: &Notes,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn delete_note(&self, user_id: &UserId, note_id: NoteId) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn save_reflection(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        reflection: &Reflection,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn send_feedback(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        content: &str,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures, including rejected credentials.
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures, including an existing account.
    async fn signup(&self, form: &SignupForm) -> Result<AuthResponse, ApiError>;
}

/// Aggregates the remote seams behind trait objects.
#[derive(Clone)]
pub struct Remote {
    pub courses: Arc<dyn CourseApi>,
    pub progress: Arc<dyn ProgressApi>,
    pub auth: Arc<dyn AuthApi>,
}

impl Remote {
    /// Build a `Remote` that talks HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be constructed.
    pub fn http(config: ApiConfig, session: Arc<dyn SessionRepository>) -> Result<Self, ApiError> {
        let client = HttpClient::new(config, session)?;
        Ok(Self::from_shared(Arc::new(client)))
    }

    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    fn from_shared<T>(backend: Arc<T>) -> Self
    where
        T: CourseApi + ProgressApi + AuthApi + 'static,
    {
        let courses: Arc<dyn CourseApi> = backend.clone();
        let progress: Arc<dyn ProgressApi> = backend.clone();
        let auth: Arc<dyn AuthApi> = backend;
        Self {
            courses,
            progress,
            auth,
        }
    }
}
