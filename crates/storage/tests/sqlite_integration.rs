use chrono::Duration;
use serde_json::json;
use signal_core::grading::{QuizSubmission, apply_submission};
use signal_core::model::{
    ActivityDraft, ActivityEventType, ActivityLogEntry, ChapterId, CourseId, QuizAttempt, User,
    demo_course,
};
use signal_core::time::fixed_now;
use storage::repository::{
    ActivityLogRepository, CourseRepository, Storage, StorageError, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!(
        "sqlite:file:{name}?mode=memory&cache=shared"
    ))
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_users_round_trip_and_conflict() {
    let repo = connect("memdb_users").await;

    let user = User::new("ada").unwrap();
    repo.insert_user(&user).await.unwrap();
    assert!(matches!(
        repo.insert_user(&user).await,
        Err(StorageError::Conflict)
    ));

    repo.upsert_user(&user.clone().with_about_me("ICU nurse"))
        .await
        .unwrap();
    let fetched = repo.get_user("ada").await.unwrap();
    assert_eq!(fetched.about_me(), "ICU nurse");
    assert!(matches!(
        repo.get_user("nobody").await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_course_document_keeps_progress_and_history() {
    let repo = connect("memdb_course_doc").await;

    let mut course = demo_course(CourseId::new("demo-1"), fixed_now());
    course.username = Some("ada".into());
    let chapter = ChapterId::new(1);
    let quiz = course.chapter(chapter).unwrap().quiz.clone();
    let attempt = QuizAttempt::grade(&quiz, &[Some(3), Some(1), Some(0), None, None]);
    course.progress = Some(apply_submission(
        &course,
        QuizSubmission::from_attempt(chapter, &attempt),
    ));
    course.record_answers(chapter, attempt.into_answers());

    repo.upsert_course(&course, fixed_now()).await.unwrap();
    let fetched = repo.get_course(&course.course_id).await.unwrap();
    assert_eq!(fetched, course);
    assert_eq!(fetched.progress.unwrap().overall_grade, 40);

    let owned = repo.courses_for_user("ada").await.unwrap();
    assert_eq!(owned.len(), 1);
}

#[tokio::test]
async fn sqlite_orders_courses_by_creation_and_by_save_time() {
    let repo = connect("memdb_course_order").await;

    let base = fixed_now();
    for (i, id) in ["late", "early", "middle"].iter().enumerate() {
        let created = match *id {
            "early" => base - Duration::days(2),
            "middle" => base - Duration::days(1),
            _ => base,
        };
        let mut course = demo_course(CourseId::new(*id), created);
        course.username = Some("ada".into());
        let saved_at = base + Duration::minutes(i64::try_from(i).unwrap());
        repo.upsert_course(&course, saved_at).await.unwrap();
    }

    let owned: Vec<String> = repo
        .courses_for_user("ada")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.course_id.to_string())
        .collect();
    assert_eq!(owned, vec!["early", "middle", "late"]);

    let recent: Vec<String> = repo
        .recent_courses(2)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.course_id.to_string())
        .collect();
    assert_eq!(recent, vec!["middle", "early"]);
}

#[tokio::test]
async fn sqlite_activity_log_is_append_only_and_newest_first() {
    let repo = connect("memdb_activity").await;

    let first = ActivityLogEntry::stamped(
        ActivityEventType::GenerateCourse,
        fixed_now(),
        ActivityDraft::for_user("ada").with_request(json!({ "topic": "sepsis" })),
    );
    let second = ActivityLogEntry::stamped(
        ActivityEventType::Login,
        fixed_now() + Duration::minutes(1),
        ActivityDraft::for_user("ada"),
    );
    repo.append_log(&first).await.unwrap();
    repo.append_log(&second).await.unwrap();
    assert!(matches!(
        repo.append_log(&first).await,
        Err(StorageError::Conflict)
    ));

    let logs = repo.recent_logs(10).await.unwrap();
    assert_eq!(logs, vec![second, first.clone()]);
    assert_eq!(logs[1].requested_topic(), Some("sepsis"));

    assert_eq!(repo.recent_logs(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn storage_sqlite_wires_all_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .users
        .insert_user(&User::new("ada").unwrap())
        .await
        .unwrap();
    assert!(storage.courses.recent_courses(80).await.unwrap().is_empty());
    assert!(storage.activity.recent_logs(80).await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_database_is_reported_at_connect() {
    let result = SqliteRepository::connect("sqlite:/definitely/missing/dir/signal.sqlite3").await;
    assert!(result.is_err());
}
