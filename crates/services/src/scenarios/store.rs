use std::collections::HashMap;

use learnaid_core::model::{Scenario, ScenarioId};
use rand::Rng;

use super::draw::draw;
use crate::epoch::{LoadTicket, RequestEpoch};
use crate::error::QuizError;

/// Scenario pool plus an optional randomly drawn quiz over it.
///
/// Navigation acts on the active sequence: the quiz while quiz mode is on,
/// the whole pool otherwise.
#[derive(Debug, Default)]
pub struct ScenarioQuizStore {
    pool: Vec<Scenario>,
    quiz: Vec<Scenario>,
    quiz_mode: bool,
    current_index: usize,
    answers: HashMap<ScenarioId, String>,
    completed: bool,
    loading: bool,
    error: Option<String>,
    epoch: RequestEpoch,
}

impl ScenarioQuizStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.loading = true;
        self.error = None;
        self.epoch.issue()
    }

    /// Installs a freshly loaded pool unless `ticket` is stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, pool: Vec<Scenario>) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.load_pool(pool);
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

    /// Replaces the pool and returns to browsing from the first scenario.
    pub fn load_pool(&mut self, pool: Vec<Scenario>) {
        self.pool = pool;
        self.quiz.clear();
        self.quiz_mode = false;
        self.current_index = 0;
        self.answers.clear();
        self.completed = false;
        self.loading = false;
        self.error = None;
    }

    /// Enters quiz mode over `n` scenarios drawn without replacement.
    ///
    /// A request larger than the pool is clamped to the pool size. Returns the
    /// number of scenarios actually drawn.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuiz` when `n` is zero or the pool is empty;
    /// the store is left as it was.
    pub fn start_quiz<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Result<usize, QuizError> {
        if n == 0 || self.pool.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        if n > self.pool.len() {
            tracing::warn!(
                requested = n,
                available = self.pool.len(),
                "quiz size exceeds scenario pool, clamping"
            );
        }

        self.quiz = draw(&self.pool, n, rng);
        self.quiz_mode = true;
        self.current_index = 0;
        self.answers.clear();
        self.completed = false;
        Ok(self.quiz.len())
    }

    /// Records the chosen option without moving.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StaleReference` if the scenario is not in the active sequence.
    pub fn answer(
        &mut self,
        scenario_id: &ScenarioId,
        option: impl Into<String>,
    ) -> Result<(), QuizError> {
        if !self.active().iter().any(|s| &s.id == scenario_id) {
            return Err(QuizError::StaleReference(scenario_id.clone()));
        }
        self.answers.insert(scenario_id.clone(), option.into());
        Ok(())
    }

    /// Moves forward; on the last scenario marks the run completed instead.
    ///
    /// Completion is one-way: advancing again keeps it set.
    pub fn advance(&mut self) {
        let len = self.active().len();
        if len == 0 {
            return;
        }
        if self.current_index + 1 < len {
            self.current_index += 1;
        } else {
            self.completed = true;
        }
    }

    pub fn retreat(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    /// Leaves quiz mode and returns to browsing the pool from the start.
    pub fn exit_quiz(&mut self) {
        self.quiz.clear();
        self.quiz_mode = false;
        self.current_index = 0;
        self.completed = false;
        self.answers.clear();
    }

    /// Drops the pool and invalidates in-flight loads.
    pub fn reset(&mut self) {
        self.load_pool(Vec::new());
        self.epoch.invalidate();
    }

    #[must_use]
    pub fn active(&self) -> &[Scenario] {
        if self.quiz_mode {
            &self.quiz
        } else {
            &self.pool
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Scenario> {
        self.active().get(self.current_index)
    }

    #[must_use]
    pub fn pool(&self) -> &[Scenario] {
        &self.pool
    }

    #[must_use]
    pub fn is_quiz_mode(&self) -> bool {
        self.quiz_mode
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answer_for(&self, scenario_id: &ScenarioId) -> Option<&str> {
        self.answers.get(scenario_id).map(String::as_str)
    }

    /// Correct answers across the active sequence.
    #[must_use]
    pub fn score(&self) -> usize {
        self.active()
            .iter()
            .filter(|s| self.answer_for(&s.id).is_some_and(|a| s.is_correct(a)))
            .count()
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
