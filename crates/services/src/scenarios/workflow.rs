use std::sync::Arc;

use learnaid_core::model::{ScenarioAttempt, ScenarioId, UserId};
use rand::Rng;
use storage::repository::ScenarioAttemptRepository;

use super::store::ScenarioQuizStore;
use crate::Clock;
use crate::error::QuizError;

/// Number of scenarios in a quiz unless configured otherwise.
pub const DEFAULT_QUIZ_SIZE: usize = 5;

/// Result of answering the current scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub attempt_id: i64,
    pub is_correct: bool,
    pub completed: bool,
}

/// Runs emergency quizzes and keeps the attempt log.
#[derive(Clone)]
pub struct ScenarioQuizService {
    clock: Clock,
    attempts: Arc<dyn ScenarioAttemptRepository>,
    user_id: UserId,
    quiz_size: usize,
}

impl ScenarioQuizService {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn ScenarioAttemptRepository>, user_id: UserId) -> Self {
        Self {
            clock,
            attempts,
            user_id,
            quiz_size: DEFAULT_QUIZ_SIZE,
        }
    }

    #[must_use]
    pub fn with_quiz_size(mut self, quiz_size: usize) -> Self {
        self.quiz_size = quiz_size;
        self
    }

    #[must_use]
    pub fn quiz_size(&self) -> usize {
        self.quiz_size
    }

    /// Loads the bundled scenario pool into `store`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Bundled` if the asset cannot be decoded; the message
    /// is also kept on the store.
    pub fn load_bundled(&self, store: &mut ScenarioQuizStore) -> Result<usize, QuizError> {
        let ticket = store.begin_load();
        match storage::bundled::scenarios() {
            Ok(pool) => {
                let count = pool.len();
                store.finish_load(ticket, pool);
                tracing::debug!(count, "scenario pool loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(error = %err, "bundled scenarios unavailable");
                store.fail_load(ticket, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Starts a quiz of the configured size.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuiz` when nothing can be drawn.
    pub fn start_quiz<R: Rng + ?Sized>(
        &self,
        store: &mut ScenarioQuizStore,
        rng: &mut R,
    ) -> Result<usize, QuizError> {
        let drawn = store.start_quiz(self.quiz_size, rng)?;
        tracing::info!(drawn, "quiz started");
        Ok(drawn)
    }

    /// Appends one attempt to the log.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the append fails.
    pub async fn record_attempt(&self, attempt: &ScenarioAttempt) -> Result<i64, QuizError> {
        let id = self.attempts.append_attempt(attempt).await?;
        Ok(id)
    }

    /// Answers the current scenario, logs the attempt, then moves on.
    ///
    /// The store only advances once the attempt is stored, so a failed append
    /// leaves the learner on the same scenario with the answer recorded.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCurrent` if `scenario_id` is not the scenario on
    /// screen and `QuizError::Storage` if the attempt cannot be appended.
    pub async fn submit_and_advance(
        &self,
        store: &mut ScenarioQuizStore,
        scenario_id: &ScenarioId,
        selected_option: &str,
    ) -> Result<SubmitOutcome, QuizError> {
        let scenario = match store.current() {
            Some(current) if &current.id == scenario_id => current.clone(),
            _ => return Err(QuizError::NotCurrent(scenario_id.clone())),
        };

        store.answer(scenario_id, selected_option)?;
        let attempt = ScenarioAttempt::new(
            self.user_id.clone(),
            &scenario,
            selected_option,
            self.clock.now(),
        );
        let attempt_id = match self.attempts.append_attempt(&attempt).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(scenario_id = %scenario_id, error = %err, "attempt not logged, staying put");
                return Err(err.into());
            }
        };

        store.advance();
        Ok(SubmitOutcome {
            attempt_id,
            is_correct: attempt.is_correct(),
            completed: store.is_completed(),
        })
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the log cannot be read.
    pub async fn history(&self) -> Result<Vec<ScenarioAttempt>, QuizError> {
        Ok(self.attempts.attempts_for_user(&self.user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use learnaid_core::time::{fixed_clock, fixed_now};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::{InMemoryRepository, StorageError};

    struct BrokenLog;

    #[async_trait]
    impl ScenarioAttemptRepository for BrokenLog {
        async fn append_attempt(&self, _attempt: &ScenarioAttempt) -> Result<i64, StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn attempts_for_user(
            &self,
            _user_id: &UserId,
        ) -> Result<Vec<ScenarioAttempt>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn service(attempts: Arc<dyn ScenarioAttemptRepository>) -> ScenarioQuizService {
        ScenarioQuizService::new(fixed_clock(), attempts, UserId::new("u1"))
    }

    #[tokio::test]
    async fn submit_and_advance_logs_then_moves() {
        let svc = service(Arc::new(InMemoryRepository::new()));
        let mut store = ScenarioQuizStore::new();
        svc.load_bundled(&mut store).unwrap();
        svc.start_quiz(&mut store, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let current = store.current().unwrap().clone();
        let outcome = svc
            .submit_and_advance(&mut store, &current.id, &current.correct_option)
            .await
            .unwrap();

        assert!(outcome.is_correct);
        assert!(!outcome.completed);
        assert_eq!(store.current_index(), 1);
        let history = svc.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].scenario_id(), &current.id);
    }

    #[tokio::test]
    async fn attempts_are_stamped_with_the_service_clock() {
        let repo: Arc<dyn ScenarioAttemptRepository> = Arc::new(InMemoryRepository::new());
        let mut clock = fixed_clock();
        let early = ScenarioQuizService::new(clock, Arc::clone(&repo), UserId::new("u1"));
        let mut store = ScenarioQuizStore::new();
        early.load_bundled(&mut store).unwrap();
        early
            .start_quiz(&mut store, &mut StdRng::seed_from_u64(5))
            .unwrap();

        let id = store.current().unwrap().id.clone();
        early.submit_and_advance(&mut store, &id, "x").await.unwrap();

        clock.advance(Duration::minutes(5));
        let later = ScenarioQuizService::new(clock, Arc::clone(&repo), UserId::new("u1"));
        let id = store.current().unwrap().id.clone();
        later.submit_and_advance(&mut store, &id, "x").await.unwrap();

        let history = later.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].attempted_at(), fixed_now());
        assert_eq!(history[1].attempted_at(), fixed_now() + Duration::minutes(5));
    }

    #[tokio::test]
    async fn failed_append_does_not_advance() {
        let svc = service(Arc::new(BrokenLog));
        let mut store = ScenarioQuizStore::new();
        svc.load_bundled(&mut store).unwrap();
        svc.start_quiz(&mut store, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let current = store.current().unwrap().id.clone();
        let err = svc
            .submit_and_advance(&mut store, &current, "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Storage(_)));
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.answer_for(&current), Some("anything"));
    }

    #[tokio::test]
    async fn only_the_current_scenario_can_be_submitted() {
        let svc = service(Arc::new(InMemoryRepository::new()));
        let mut store = ScenarioQuizStore::new();
        svc.load_bundled(&mut store).unwrap();
        let err = svc
            .submit_and_advance(&mut store, &ScenarioId::new("sc-heatstroke"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::NotCurrent(_)));
    }

    #[tokio::test]
    async fn configured_size_completes_after_last_submit() {
        let svc = service(Arc::new(InMemoryRepository::new())).with_quiz_size(2);
        let mut store = ScenarioQuizStore::new();
        svc.load_bundled(&mut store).unwrap();
        assert_eq!(
            svc.start_quiz(&mut store, &mut StdRng::seed_from_u64(9))
                .unwrap(),
            2
        );

        let mut last = None;
        for _ in 0..2 {
            let id = store.current().unwrap().id.clone();
            last = Some(svc.submit_and_advance(&mut store, &id, "x").await.unwrap());
        }
        assert!(last.unwrap().completed);
        assert_eq!(svc.history().await.unwrap().len(), 2);
    }
}
