use std::sync::Arc;

use learnaid_core::model::{CourseId, CourseListItem, CourseOverview, UserId};

use crate::epoch::{LoadTicket, RequestEpoch};
use crate::error::CatalogError;
use crate::remote::CourseApi;

/// Course list shown on the home screen.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    courses: Vec<CourseListItem>,
    loading: bool,
    error: Option<String>,
    epoch: RequestEpoch,
}

impl CourseCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.loading = true;
        self.error = None;
        self.epoch.issue()
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, courses: Vec<CourseListItem>) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.courses = courses;
        self.loading = false;
        true
    }

    pub fn fail_load(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.error = Some(message.into());
        true
    }

    #[must_use]
    pub fn courses(&self) -> &[CourseListItem] {
        &self.courses
    }

    #[must_use]
    pub fn find(&self, course_id: &CourseId) -> Option<&CourseListItem> {
        self.courses.iter().find(|c| &c.id == course_id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Lists courses, shows their overview and enrolls learners.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseApi>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseApi>) -> Self {
        Self { courses }
    }

    /// Reloads the course list into `catalog`. Returns the number of courses applied.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` after recording the failure on the catalog.
    pub async fn refresh(&self, catalog: &mut CourseCatalog) -> Result<usize, CatalogError> {
        let ticket = catalog.begin_load();
        match self.courses.list_courses().await {
            Ok(courses) => {
                let count = courses.len();
                if !catalog.finish_load(ticket, courses) {
                    tracing::debug!("discarding stale course list");
                    return Ok(0);
                }
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(error = %err, "course list failed to load");
                catalog.fail_load(ticket, err.to_string());
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` on remote failure.
    pub async fn overview(&self, course_id: &CourseId) -> Result<CourseOverview, CatalogError> {
        Ok(self.courses.course_overview(course_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` on remote failure.
    pub async fn enroll(&self, user_id: &UserId, course_id: &CourseId) -> Result<(), CatalogError> {
        self.courses.enroll(user_id, course_id).await?;
        tracing::info!(user_id = %user_id, course_id = %course_id, "enrolled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryBackend;
    use learnaid_core::model::Step;

    fn item(id: &str) -> CourseListItem {
        CourseListItem {
            id: CourseId::new(id),
            title: id.to_uppercase(),
            description: String::new(),
            icon: None,
        }
    }

    #[tokio::test]
    async fn refresh_fills_catalog() {
        let backend = InMemoryBackend::new();
        backend.add_course(item("cpr"), vec![Step::finish("done", "Done")]);
        backend.add_course(item("burns"), vec![Step::finish("done", "Done")]);
        let service = CatalogService::new(Arc::new(backend));
        let mut catalog = CourseCatalog::new();

        assert_eq!(service.refresh(&mut catalog).await.unwrap(), 2);
        assert!(catalog.find(&CourseId::new("burns")).is_some());
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let backend = InMemoryBackend::new();
        backend.add_course(item("cpr"), vec![Step::finish("done", "Done")]);
        let service = CatalogService::new(Arc::new(backend.clone()));
        let mut catalog = CourseCatalog::new();
        service.refresh(&mut catalog).await.unwrap();

        backend.set_offline(true);
        assert!(service.refresh(&mut catalog).await.is_err());
        assert_eq!(catalog.courses().len(), 1);
        assert!(catalog.error().is_some());
    }

    #[tokio::test]
    async fn enroll_requires_existing_course() {
        let backend = InMemoryBackend::new();
        backend.add_course(item("cpr"), vec![Step::finish("done", "Done")]);
        let service = CatalogService::new(Arc::new(backend.clone()));
        let user = UserId::new("u1");

        service.enroll(&user, &CourseId::new("cpr")).await.unwrap();
        assert!(backend.is_enrolled(&user, &CourseId::new("cpr")));
        assert!(service.enroll(&user, &CourseId::new("nope")).await.is_err());
    }
}
