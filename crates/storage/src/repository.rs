use async_trait::async_trait;
use learnaid_core::model::{ScenarioAttempt, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fixed keys of the persisted login session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AuthToken,
    RefreshToken,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [Self::AuthToken, Self::RefreshToken, Self::User];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::AuthToken => "authToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::User => "user",
        }
    }
}

/// Small key/value store holding the auth token and serialized user record.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: SessionKey, value: &str) -> Result<(), StorageError>;

    /// Removes every session key at once (logout).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Append-only log of answered emergency scenarios.
#[async_trait]
pub trait ScenarioAttemptRepository: Send + Sync {
    /// Append one attempt and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &ScenarioAttempt) -> Result<i64, StorageError>;

    /// All attempts by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn attempts_for_user(&self, user_id: &UserId)
    -> Result<Vec<ScenarioAttempt>, StorageError>;
}

/// In-memory repository for tests and prototyping.
///
/// Each instance owns its own state; clones share it.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    session: Arc<Mutex<HashMap<SessionKey, String>>>,
    attempts: Arc<Mutex<Vec<ScenarioAttempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_owned());
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

#[async_trait]
impl ScenarioAttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &ScenarioAttempt) -> Result<i64, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(attempt.clone());
        i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))
    }

    async fn attempts_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ScenarioAttempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect())
    }
}

/// Aggregates local repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub session: Arc<dyn SessionRepository>,
    pub attempts: Arc<dyn ScenarioAttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let session: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn ScenarioAttemptRepository> = Arc::new(repo);
        Self { session, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnaid_core::model::{Scenario, ScenarioId};
    use learnaid_core::time::fixed_now;

    fn scenario() -> Scenario {
        Scenario {
            id: ScenarioId::new("burn"),
            prompt: "Hot water spilled on an arm.".into(),
            options: vec!["Cool water".into(), "Butter".into()],
            correct_option: "Cool water".into(),
            explanation: "Cool the burn under running water.".into(),
            image: None,
        }
    }

    #[tokio::test]
    async fn attempts_are_appended_never_merged() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let attempt = ScenarioAttempt::new(user.clone(), &scenario(), "Butter", fixed_now());

        let first = repo.append_attempt(&attempt).await.unwrap();
        let second = repo.append_attempt(&attempt).await.unwrap();
        assert_ne!(first, second);

        let stored = repo.attempts_for_user(&user).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(repo
            .attempts_for_user(&UserId::new("other"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn clear_all_drops_every_session_key() {
        let repo = InMemoryRepository::new();
        for key in SessionKey::ALL {
            repo.set(key, "value").await.unwrap();
        }
        repo.clear_all().await.unwrap();
        for key in SessionKey::ALL {
            assert_eq!(repo.get(key).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn separate_instances_do_not_share_state() {
        let a = InMemoryRepository::new();
        let b = InMemoryRepository::new();
        a.set(SessionKey::AuthToken, "t").await.unwrap();
        assert_eq!(b.get(SessionKey::AuthToken).await.unwrap(), None);
    }
}
