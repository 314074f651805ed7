use learnaid_core::model::{Scenario, ScenarioAttempt, ScenarioId, UserId};
use learnaid_core::time::fixed_now;
use storage::repository::{ScenarioAttemptRepository, SessionKey, SessionRepository};
use storage::sqlite::SqliteRepository;

fn cpr() -> Scenario {
    Scenario {
        id: ScenarioId::new("sc-collapse"),
        prompt: "Someone collapses.".into(),
        options: vec!["Compressions".into(), "Wait".into()],
        correct_option: "Compressions".into(),
        explanation: "Start CPR.".into(),
        image: None,
    }
}

#[tokio::test]
async fn sqlite_session_keys_upsert_and_clear() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_session?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.set(SessionKey::AuthToken, "first").await.unwrap();
    repo.set(SessionKey::AuthToken, "second").await.unwrap();
    repo.set(SessionKey::User, r#"{"id":"1"}"#).await.unwrap();

    assert_eq!(
        repo.get(SessionKey::AuthToken).await.unwrap().as_deref(),
        Some("second")
    );

    repo.clear_all().await.unwrap();
    assert_eq!(repo.get(SessionKey::AuthToken).await.unwrap(), None);
    assert_eq!(repo.get(SessionKey::User).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_attempt_log_is_append_only() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_attempts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice must be harmless.
    repo.migrate().await.expect("migrate again");

    let user = UserId::new("u1");
    let wrong = ScenarioAttempt::new(user.clone(), &cpr(), "Wait", fixed_now());
    let right = ScenarioAttempt::new(user.clone(), &cpr(), "Compressions", fixed_now());

    let id1 = repo.append_attempt(&wrong).await.unwrap();
    let id2 = repo.append_attempt(&right).await.unwrap();
    let id3 = repo.append_attempt(&right).await.unwrap();
    assert!(id1 < id2 && id2 < id3);

    let stored = repo.attempts_for_user(&user).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0], wrong);
    assert!(!stored[0].is_correct());
    assert!(stored[1].is_correct());
    assert_eq!(stored[2].attempted_at(), fixed_now());

    let other = repo.attempts_for_user(&UserId::new("u2")).await.unwrap();
    assert!(other.is_empty());
}
