use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use learnaid_core::model::{
    AuthResponse, CourseId, CourseListItem, CourseOverview, LoginForm, Note, NoteId, Notes,
    Percent, ProgressError, ProgressSnapshot, ProgressUpdate, SignupForm, Step, User, UserId,
};
use reqwest::StatusCode;

use super::{AuthApi, CourseApi, ProgressApi, Reflection};
use crate::error::ApiError;

#[derive(Debug, Default)]
struct BackendState {
    courses: Vec<CourseListItem>,
    overviews: HashMap<CourseId, CourseOverview>,
    steps: HashMap<CourseId, Vec<Step>>,
    progress: HashMap<(UserId, CourseId), ProgressSnapshot>,
    saved_updates: Vec<(CourseId, ProgressUpdate)>,
    feedback: Vec<(CourseId, String)>,
    accounts: HashMap<String, (User, String)>,
    enrollments: HashSet<(UserId, CourseId)>,
    offline: bool,
    issued: u64,
}

impl BackendState {
    fn reachable(&self) -> Result<(), ApiError> {
        if self.offline {
            return Err(ApiError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(())
    }

    fn snapshot_mut(&mut self, user_id: &UserId, course_id: &CourseId) -> &mut ProgressSnapshot {
        self.progress
            .entry((user_id.clone(), course_id.clone()))
            .or_default()
    }

    fn note_owner(&mut self, user_id: &UserId, note_id: NoteId) -> Option<&mut ProgressSnapshot> {
        self.progress
            .iter_mut()
            .find(|((user, _), snap)| user == user_id && snap.notes.get(note_id).is_some())
            .map(|(_, snap)| snap)
    }

    fn issue_auth(&mut self, user: User) -> AuthResponse {
        self.issued += 1;
        AuthResponse {
            user,
            token: format!("token-{}", self.issued),
            refresh_token: Some(format!("refresh-{}", self.issued)),
        }
    }
}

/// Backend fake that keeps every resource in memory.
///
/// Clones share state, so a test can keep a handle for setup and inspection
/// while services own another. Missing records answer 404 the way the REST
/// backend does; `set_offline(true)` turns every call into a 503.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a course with its ordered steps.
    pub fn add_course(&self, course: CourseListItem, steps: Vec<Step>) {
        let mut state = self.state();
        state.steps.insert(course.id.clone(), steps);
        state.courses.retain(|c| c.id != course.id);
        state.courses.push(course);
    }

    pub fn set_overview(&self, overview: CourseOverview) {
        self.state().overviews.insert(overview.id.clone(), overview);
    }

    pub fn set_progress(&self, user_id: &UserId, course_id: &CourseId, snapshot: ProgressSnapshot) {
        self.state()
            .progress
            .insert((user_id.clone(), course_id.clone()), snapshot);
    }

    /// Registers an account that `login` will accept.
    pub fn add_account(&self, user: User, password: impl Into<String>) {
        self.state()
            .accounts
            .insert(user.email.to_lowercase(), (user, password.into()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    #[must_use]
    pub fn progress_of(&self, user_id: &UserId, course_id: &CourseId) -> Option<ProgressSnapshot> {
        self.state()
            .progress
            .get(&(user_id.clone(), course_id.clone()))
            .cloned()
    }

    /// Every progress update received, oldest first.
    #[must_use]
    pub fn saved_updates(&self) -> Vec<(CourseId, ProgressUpdate)> {
        self.state().saved_updates.clone()
    }

    #[must_use]
    pub fn feedback(&self) -> Vec<(CourseId, String)> {
        self.state().feedback.clone()
    }

    #[must_use]
    pub fn is_enrolled(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        self.state()
            .enrollments
            .contains(&(user_id.clone(), course_id.clone()))
    }
}

fn not_found() -> ApiError {
    ApiError::HttpStatus(StatusCode::NOT_FOUND)
}

fn completion(snapshot: &ProgressSnapshot) -> Percent {
    let total = snapshot.modules.len();
    if total == 0 {
        return Percent::ZERO;
    }
    let done = snapshot.modules.iter().filter(|m| m.completed).count();
    u8::try_from(done * 100 / total)
        .ok()
        .and_then(|p| Percent::new(p).ok())
        .unwrap_or_default()
}

#[async_trait]
impl CourseApi for InMemoryBackend {
    async fn list_courses(&self) -> Result<Vec<CourseListItem>, ApiError> {
        let state = self.state();
        state.reachable()?;
        Ok(state.courses.clone())
    }

    async fn course_overview(&self, course_id: &CourseId) -> Result<CourseOverview, ApiError> {
        let state = self.state();
        state.reachable()?;
        state.overviews.get(course_id).cloned().ok_or_else(not_found)
    }

    async fn course_steps(&self, course_id: &CourseId) -> Result<Vec<Step>, ApiError> {
        let state = self.state();
        state.reachable()?;
        state.steps.get(course_id).cloned().ok_or_else(not_found)
    }

    async fn enroll(&self, user_id: &UserId, course_id: &CourseId) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        if !state.steps.contains_key(course_id) {
            return Err(not_found());
        }
        state
            .enrollments
            .insert((user_id.clone(), course_id.clone()));
        if let Some(overview) = state.overviews.get_mut(course_id) {
            overview.enrolled = true;
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressApi for InMemoryBackend {
    async fn fetch_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressSnapshot, ApiError> {
        let state = self.state();
        state.reachable()?;
        state
            .progress
            .get(&(user_id.clone(), course_id.clone()))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn save_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        state
            .saved_updates
            .push((course_id.clone(), update.clone()));

        let snapshot = state.snapshot_mut(user_id, course_id);
        snapshot.last_module_id = Some(update.current_module_id.clone());
        for module in &mut snapshot.modules {
            if update.completed_module_ids.contains(&module.id) {
                module.completed = true;
            }
        }
        snapshot.percent_complete = completion(snapshot);
        Ok(())
    }

    async fn add_note(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        note: &Note,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        state
            .snapshot_mut(user_id, course_id)
            .notes
            .insert(note.clone())
            .map_err(|_| ApiError::HttpStatus(StatusCode::BAD_REQUEST))
    }

    async fn update_note(&self, user_id: &UserId, note: &Note) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        let snapshot = state.note_owner(user_id, note.id).ok_or_else(not_found)?;
        snapshot
            .notes
            .update(note.id, note.text.clone())
            .map_err(|_| ApiError::HttpStatus(StatusCode::BAD_REQUEST))
    }

    async fn replace_notes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        notes: &Notes,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        state.snapshot_mut(user_id, course_id).notes = notes.clone();
        Ok(())
    }

    async fn delete_note(&self, user_id: &UserId, note_id: NoteId) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        let snapshot = state.note_owner(user_id, note_id).ok_or_else(not_found)?;
        snapshot.notes.remove(note_id);
        Ok(())
    }

    async fn save_reflection(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        reflection: &Reflection,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        state
            .snapshot_mut(user_id, course_id)
            .upsert_reflection(
                &reflection.module_id,
                reflection.reflection.clone(),
                reflection.confidence,
            )
            .map_err(|err| match err {
                ProgressError::UnknownModule(_) => not_found(),
                _ => ApiError::HttpStatus(StatusCode::BAD_REQUEST),
            })
    }

    async fn send_feedback(
        &self,
        _user_id: &UserId,
        course_id: &CourseId,
        content: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.reachable()?;
        state.feedback.push((course_id.clone(), content.to_owned()));
        Ok(())
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        let mut state = self.state();
        state.reachable()?;
        let user = match state.accounts.get(&form.email.trim().to_lowercase()) {
            Some((user, password)) if *password == form.password => user.clone(),
            _ => return Err(ApiError::HttpStatus(StatusCode::UNAUTHORIZED)),
        };
        Ok(state.issue_auth(user))
    }

    async fn signup(&self, form: &SignupForm) -> Result<AuthResponse, ApiError> {
        let mut state = self.state();
        state.reachable()?;
        let email = form.email.trim().to_lowercase();
        if state.accounts.contains_key(&email) {
            return Err(ApiError::HttpStatus(StatusCode::CONFLICT));
        }
        let user = User {
            id: UserId::new(format!("user-{}", state.accounts.len() + 1)),
            email: email.clone(),
            name: form.name.trim().to_owned(),
            avatar: None,
        };
        state
            .accounts
            .insert(email, (user.clone(), form.password.clone()));
        Ok(state.issue_auth(user))
    }
}
