use learnaid_core::model::{ScenarioAttempt, UserId};

use super::{SqliteRepository, mapping::map_attempt_row};
use crate::repository::{ScenarioAttemptRepository, StorageError};

#[async_trait::async_trait]
impl ScenarioAttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &ScenarioAttempt) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO scenario_attempts (
                    user_id, scenario_id, selected_option, is_correct, attempted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(attempt.user_id().as_str())
        .bind(attempt.scenario_id().as_str())
        .bind(attempt.selected_option())
        .bind(i64::from(attempt.is_correct()))
        .bind(attempt.attempted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn attempts_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ScenarioAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, scenario_id, selected_option, is_correct, attempted_at
                FROM scenario_attempts
                WHERE user_id = ?1
                ORDER BY attempted_at ASC, id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_attempt_row).collect()
    }
}
