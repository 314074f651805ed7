use learnaid_core::model::{ScenarioAttempt, ScenarioId, UserId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ScenarioAttempt, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let scenario_id: String = row.try_get("scenario_id").map_err(ser)?;
    let selected_option: String = row.try_get("selected_option").map_err(ser)?;
    let is_correct: i64 = row.try_get("is_correct").map_err(ser)?;
    let attempted_at: chrono::DateTime<chrono::Utc> = row.try_get("attempted_at").map_err(ser)?;

    let is_correct = match is_correct {
        0 => false,
        1 => true,
        other => {
            return Err(StorageError::Serialization(format!(
                "invalid is_correct flag: {other}"
            )));
        }
    };

    Ok(ScenarioAttempt::from_persisted(
        UserId::new(user_id),
        ScenarioId::new(scenario_id),
        selected_option,
        is_correct,
        attempted_at,
    ))
}
