use std::collections::HashMap;

use learnaid_core::model::{CourseId, CourseSteps, ProgressUpdate, Step, StepId};

use crate::epoch::{LoadTicket, RequestEpoch};
use crate::error::CourseStepError;

/// Lifecycle of a store: `Idle -> Loading -> Ready`, back to `Idle` on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Idle,
    Loading,
    Ready,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Step sequence of one course, the learner's position in it, and recorded answers.
///
/// The store is synchronous. Loads are split into `begin_load` and
/// `apply_steps`/`fail_load` so that a response carrying an outdated
/// `LoadTicket` is dropped instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct CourseStepStore {
    course_id: Option<CourseId>,
    steps: Vec<Step>,
    current_index: usize,
    answers: HashMap<StepId, String>,
    current_module_id: Option<StepId>,
    loading: bool,
    error: Option<String>,
    epoch: RequestEpoch,
}

impl CourseStepStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a load of `course_id` as in flight and returns its ticket.
    pub fn begin_load(&mut self, course_id: CourseId) -> LoadTicket {
        self.course_id = Some(course_id);
        self.loading = true;
        self.error = None;
        self.epoch.issue()
    }

    /// Replaces the sequence with freshly loaded steps.
    ///
    /// Returns `false` and leaves the store untouched when `ticket` is stale.
    pub fn apply_steps(&mut self, ticket: LoadTicket, steps: CourseSteps) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.steps = steps.into_vec();
        self.current_index = 0;
        self.answers.clear();
        self.current_module_id = self.steps.first().map(|s| s.id.clone());
        self.loading = false;
        self.error = None;
        true
    }

    /// Records a failed load. Stale failures are ignored.
    pub fn fail_load(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.error = Some(message.into());
        true
    }

    /// Moves to the step the backend last recorded, if it is still in the course.
    pub fn restore_position(&mut self, ticket: LoadTicket, last_module_id: &StepId) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.set_current_by_id(last_module_id).is_ok()
    }

    /// Records the chosen option for a multiple choice step, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `CourseStepError::NotLoaded` on an empty store,
    /// `CourseStepError::StaleReference` for an id outside the sequence, and
    /// `CourseStepError::NotMultipleChoice` for info and finish steps.
    pub fn submit_answer(
        &mut self,
        step_id: &StepId,
        option: impl Into<String>,
    ) -> Result<(), CourseStepError> {
        let step = self.find(step_id)?;
        if !step.is_multiple_choice() {
            return Err(CourseStepError::NotMultipleChoice(step_id.clone()));
        }
        self.answers.insert(step_id.clone(), option.into());
        Ok(())
    }

    /// Moves forward one step. No-op on the last step.
    pub fn advance(&mut self) -> bool {
        if self.current_index + 1 >= self.steps.len() {
            return false;
        }
        self.current_index += 1;
        self.current_module_id = Some(self.steps[self.current_index].id.clone());
        true
    }

    /// Moves back one step. No-op on the first step.
    pub fn retreat(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        self.current_module_id = Some(self.steps[self.current_index].id.clone());
        true
    }

    /// Jumps to the step with the given id.
    ///
    /// # Errors
    ///
    /// Returns `CourseStepError::NotLoaded` or `CourseStepError::StaleReference`.
    pub fn set_current_by_id(&mut self, step_id: &StepId) -> Result<(), CourseStepError> {
        self.find(step_id)?;
        if let Some(index) = self.steps.iter().position(|s| &s.id == step_id) {
            self.current_index = index;
            self.current_module_id = Some(step_id.clone());
        }
        Ok(())
    }

    /// Position report for the backend.
    ///
    /// Completion is positional: every step before the current index counts
    /// as done, whether or not its question was answered correctly.
    #[must_use]
    pub fn progress_update(&self) -> Option<ProgressUpdate> {
        let current = self.current_module_id.clone()?;
        let completed_module_ids = self.steps[..self.current_index]
            .iter()
            .map(|s| s.id.clone())
            .collect();
        Some(ProgressUpdate {
            current_module_id: current,
            completed_module_ids,
        })
    }

    /// Drops everything and invalidates in-flight loads.
    pub fn reset(&mut self) {
        self.course_id = None;
        self.steps.clear();
        self.current_index = 0;
        self.answers.clear();
        self.current_module_id = None;
        self.loading = false;
        self.error = None;
        self.epoch.invalidate();
    }

    fn find(&self, step_id: &StepId) -> Result<&Step, CourseStepError> {
        if self.steps.is_empty() {
            return Err(CourseStepError::NotLoaded);
        }
        self.steps
            .iter()
            .find(|s| &s.id == step_id)
            .ok_or_else(|| CourseStepError::StaleReference(step_id.clone()))
    }

    #[must_use]
    pub fn phase(&self) -> StorePhase {
        if self.loading {
            StorePhase::Loading
        } else if self.steps.is_empty() {
            StorePhase::Idle
        } else {
            StorePhase::Ready
        }
    }

    #[must_use]
    pub fn course_id(&self) -> Option<&CourseId> {
        self.course_id.as_ref()
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current_index)
    }

    #[must_use]
    pub fn current_module_id(&self) -> Option<&StepId> {
        self.current_module_id.as_ref()
    }

    #[must_use]
    pub fn answer_for(&self, step_id: &StepId) -> Option<&str> {
        self.answers.get(step_id).map(String::as_str)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        !self.steps.is_empty() && self.current_index + 1 == self.steps.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn three_steps() -> CourseSteps {
        CourseSteps::new(vec![
            Step::info("info1", "Welcome", "Stay calm."),
            Step::multiple_choice("mcq1", "First move?", &["Check danger", "Run"], "Check danger"),
            Step::finish("finish", "Done"),
        ])
        .unwrap()
    }

    fn loaded(steps: CourseSteps) -> CourseStepStore {
        let mut store = CourseStepStore::new();
        let ticket = store.begin_load(CourseId::new("c1"));
        assert!(store.apply_steps(ticket, steps));
        store
    }

    fn linear(n: usize) -> CourseSteps {
        CourseSteps::new(
            (0..n)
                .map(|i| Step::info(format!("s{i}"), format!("Step {i}"), ""))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn load_moves_idle_to_ready() {
        let mut store = CourseStepStore::new();
        assert_eq!(store.phase(), StorePhase::Idle);
        let ticket = store.begin_load(CourseId::new("c1"));
        assert_eq!(store.phase(), StorePhase::Loading);
        store.apply_steps(ticket, three_steps());
        assert_eq!(store.phase(), StorePhase::Ready);
        assert_eq!(store.current_module_id(), Some(&StepId::new("info1")));
    }

    #[test]
    fn positional_completion_after_answer() {
        let mut store = loaded(three_steps());
        store.advance();
        store.submit_answer(&StepId::new("mcq1"), "X").unwrap();

        let update = store.progress_update().unwrap();
        assert_eq!(update.completed_module_ids, vec![StepId::new("info1")]);
        assert_eq!(update.current_module_id, StepId::new("mcq1"));
    }

    #[test]
    fn retreat_moves_current_module_back() {
        let mut store = loaded(three_steps());
        store.advance();
        store.advance();
        assert!(store.retreat());

        assert_eq!(store.current_module_id(), Some(&StepId::new("mcq1")));
        let update = store.progress_update().unwrap();
        assert_eq!(update.current_module_id, StepId::new("mcq1"));
        assert_eq!(update.completed_module_ids, vec![StepId::new("info1")]);
    }

    #[test]
    fn answers_survive_navigation_until_reset() {
        let mut store = loaded(three_steps());
        let mcq = StepId::new("mcq1");
        store.submit_answer(&mcq, "Run").unwrap();
        store.submit_answer(&mcq, "Check danger").unwrap();
        store.advance();
        store.advance();
        store.retreat();
        assert_eq!(store.answer_for(&mcq), Some("Check danger"));

        store.reset();
        assert_eq!(store.answer_for(&mcq), None);
        assert_eq!(store.phase(), StorePhase::Idle);
    }

    #[test]
    fn submit_answer_rejects_unknown_and_non_question_steps() {
        let mut store = CourseStepStore::new();
        assert!(matches!(
            store.submit_answer(&StepId::new("mcq1"), "X"),
            Err(CourseStepError::NotLoaded)
        ));

        let mut store = loaded(three_steps());
        assert!(matches!(
            store.submit_answer(&StepId::new("gone"), "X"),
            Err(CourseStepError::StaleReference(_))
        ));
        assert!(matches!(
            store.submit_answer(&StepId::new("info1"), "X"),
            Err(CourseStepError::NotMultipleChoice(_))
        ));
    }

    #[test]
    fn stale_load_response_is_discarded() {
        let mut store = CourseStepStore::new();
        let first = store.begin_load(CourseId::new("c1"));
        let second = store.begin_load(CourseId::new("c2"));

        assert!(store.apply_steps(second, three_steps()));
        assert!(!store.apply_steps(first, linear(7)));
        assert!(!store.fail_load(first, "timeout"));
        assert_eq!(store.steps().len(), 3);
        assert_eq!(store.error(), None);
    }

    #[test]
    fn reset_invalidates_in_flight_load() {
        let mut store = CourseStepStore::new();
        let ticket = store.begin_load(CourseId::new("c1"));
        store.reset();
        assert!(!store.apply_steps(ticket, three_steps()));
        assert_eq!(store.phase(), StorePhase::Idle);
    }

    #[test]
    fn restore_position_only_for_known_steps() {
        let mut store = CourseStepStore::new();
        let ticket = store.begin_load(CourseId::new("c1"));
        store.apply_steps(ticket, three_steps());

        assert!(!store.restore_position(ticket, &StepId::new("removed")));
        assert_eq!(store.current_index(), 0);
        assert!(store.restore_position(ticket, &StepId::new("finish")));
        assert_eq!(store.current_index(), 2);
        assert!(store.is_last_step());
    }

    #[test]
    fn failed_load_keeps_error_and_can_retry() {
        let mut store = CourseStepStore::new();
        let ticket = store.begin_load(CourseId::new("c1"));
        store.fail_load(ticket, "network down");
        assert_eq!(store.error(), Some("network down"));
        assert_eq!(store.phase(), StorePhase::Idle);

        let retry = store.begin_load(CourseId::new("c1"));
        assert_eq!(store.error(), None);
        store.apply_steps(retry, three_steps());
        assert_eq!(store.phase(), StorePhase::Ready);
    }

    proptest! {
        #[test]
        fn advance_clamps_to_last_index(n in 1usize..20, k in 0usize..40) {
            let mut store = loaded(linear(n));
            for _ in 0..k {
                store.advance();
            }
            prop_assert_eq!(store.current_index(), k.min(n - 1));
        }

        #[test]
        fn retreat_clamps_to_zero(n in 1usize..20, start in 0usize..20, k in 0usize..40) {
            let mut store = loaded(linear(n));
            let start = start.min(n - 1);
            for _ in 0..start {
                store.advance();
            }
            for _ in 0..k {
                store.retreat();
            }
            let expected = start.saturating_sub(k);
            prop_assert_eq!(store.current_index(), expected);
            prop_assert_eq!(store.current_module_id(), Some(&StepId::new(format!("s{expected}"))));
        }
    }
}
