use std::sync::Arc;

use learnaid_core::model::UserId;
use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::catalog::CatalogService;
use crate::config::ApiConfig;
use crate::course_steps::CourseStepService;
use crate::error::AppServicesError;
use crate::progress::ProgressService;
use crate::remote::{InMemoryBackend, Remote};
use crate::scenarios::ScenarioQuizService;

/// Assembles app-facing services over one storage and one backend.
///
/// Learner-scoped services are built on demand once a user is known.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    remote: Remote,
    catalog: Arc<CatalogService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        api: ApiConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let remote = Remote::http(api, Arc::clone(&storage.session))?;
        Ok(Self::from_parts(clock, storage, remote))
    }

    /// Fully in-memory services for tests and demos.
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend, clock: Clock) -> Self {
        Self::from_parts(clock, Storage::in_memory(), Remote::in_memory(backend))
    }

    #[must_use]
    pub fn from_parts(clock: Clock, storage: Storage, remote: Remote) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&remote.courses)));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&remote.auth),
            Arc::clone(&storage.session),
        ));
        Self {
            clock,
            storage,
            remote,
            catalog,
            auth,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn course_steps(&self, user_id: UserId) -> CourseStepService {
        CourseStepService::new(
            Arc::clone(&self.remote.courses),
            Arc::clone(&self.remote.progress),
            user_id,
        )
    }

    #[must_use]
    pub fn scenario_quiz(&self, user_id: UserId) -> ScenarioQuizService {
        ScenarioQuizService::new(self.clock, Arc::clone(&self.storage.attempts), user_id)
    }

    #[must_use]
    pub fn progress(&self, user_id: UserId) -> ProgressService {
        ProgressService::new(Arc::clone(&self.remote.progress), user_id)
    }
}
