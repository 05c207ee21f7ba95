use chrono::Duration;
use sphere_core::model::{QuestionDraft, QuizAttempt, QuizDraft, QuizId, QuizResult, SessionId};
use sphere_core::time::fixed_now;
use storage::repository::{AttemptRepository, NewQuizRecord, QuizRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn capitals() -> NewQuizRecord {
    let validated = QuizDraft {
        title: "Capitals".into(),
        description: Some("Europe".into()),
        questions: vec![
            QuestionDraft::new("France?", ["Paris", "Lyon", "Nice"], "Paris"),
            QuestionDraft::new("Italy?", ["Milan", "Rome"], "Rome"),
            QuestionDraft::new("Spain?", ["Madrid", "Seville", "Bilbao", "Valencia"], "Madrid"),
        ],
    }
    .validate(fixed_now())
    .unwrap();
    NewQuizRecord::from_validated(&validated)
}

fn attempt(quiz_id: QuizId, offset_secs: i64, correct: u32) -> QuizAttempt {
    let started = fixed_now() + Duration::seconds(offset_secs);
    QuizAttempt::new(
        quiz_id,
        SessionId::generate(),
        started,
        started + Duration::seconds(95),
        QuizResult::new(correct, 5, 95),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_question_order_and_options() {
    let repo = connect("memdb_quiz_roundtrip").await;

    let record = capitals();
    let id = repo.insert_new_quiz(record.clone()).await.unwrap();
    let quiz = repo.get_quiz(id).await.unwrap().expect("quiz stored");

    assert_eq!(quiz.title(), "Capitals");
    assert_eq!(quiz.description(), Some("Europe"));
    assert_eq!(quiz.created_at(), fixed_now());
    assert_eq!(quiz.questions(), record.questions.as_slice());
    assert_eq!(quiz.questions()[2].options().len(), 4);
}

#[tokio::test]
async fn sqlite_upsert_replaces_question_bank() {
    let repo = connect("memdb_quiz_upsert").await;
    let id = repo.insert_new_quiz(capitals()).await.unwrap();
    let quiz = repo.get_quiz(id).await.unwrap().unwrap();

    let changed = quiz
        .with_changes(
            Some("Capitals II".into()),
            Some(None),
            Some(vec![QuestionDraft::new("Peru?", ["Lima", "Cusco"], "Lima")]),
        )
        .unwrap();
    repo.upsert_quiz(&changed).await.unwrap();

    let stored = repo.get_quiz(id).await.unwrap().unwrap();
    assert_eq!(stored.title(), "Capitals II");
    assert_eq!(stored.description(), None);
    assert_eq!(stored.question_count(), 1);
    assert_eq!(stored.questions()[0].correct_option(), "Lima");
    assert_eq!(repo.list_quizzes(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_attempts_list_newest_first() {
    let repo = connect("memdb_attempts").await;
    let id = repo.insert_new_quiz(capitals()).await.unwrap();

    let first = repo.append_attempt(&attempt(id, 0, 2)).await.unwrap();
    let second = repo.append_attempt(&attempt(id, 3_600, 4)).await.unwrap();

    let rows = repo.list_attempts(id, 10).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);
    assert!(rows[0].attempt.result().passed);
    assert!(!rows[1].attempt.result().passed);

    let fetched = repo.get_attempt(first).await.unwrap();
    assert_eq!(fetched, rows[1].attempt);
    assert_eq!(repo.list_attempts(id, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_delete_cascades_to_attempts() {
    let repo = connect("memdb_cascade").await;
    let id = repo.insert_new_quiz(capitals()).await.unwrap();
    let row = repo.append_attempt(&attempt(id, 0, 3)).await.unwrap();

    repo.delete_quiz(id).await.unwrap();

    assert!(repo.get_quiz(id).await.unwrap().is_none());
    assert!(matches!(
        repo.get_attempt(row).await.unwrap_err(),
        StorageError::NotFound
    ));
    assert!(matches!(
        repo.delete_quiz(id).await.unwrap_err(),
        StorageError::NotFound
    ));
}

#[tokio::test]
async fn sqlite_rejects_attempt_for_missing_quiz() {
    let repo = connect("memdb_orphan_attempt").await;
    let err = repo
        .append_attempt(&attempt(QuizId::new(404), 0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    let id = repo.insert_new_quiz(capitals()).await.unwrap();
    assert_eq!(id, QuizId::new(1));
}
