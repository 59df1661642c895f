use std::sync::Arc;

use quiz_core::model::{
    ExclusionSet, MistakeRecord, ProgressState, Question, QuestionIndex, SelectionRecord, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::KeyValueStore;
use storage::sqlite::SqliteRepository;
use storage::{LocalState, Storage, keys};

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_kv_overwrites_and_removes() {
    let repo = connect("memdb_kv").await;

    assert_eq!(repo.get("missing").await.unwrap(), None);
    repo.set("k", "one").await.unwrap();
    repo.set("k", "two").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("two"));

    repo.remove("k").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.set("k", "v").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn local_state_round_trips_through_sqlite() {
    let repo = connect("memdb_local_state").await;
    let local = LocalState::new(Arc::new(repo.clone()));

    let question = Question::new("Q", vec!["A. yes".into(), "B. no".into()], "A");
    let (wrong, _) = SelectionRecord::new()
        .with_click(&question, 1)
        .unwrap()
        .submit(&question)
        .unwrap();
    let progress = ProgressState::new()
        .with_record(QuestionIndex::new(1), wrong.clone())
        .with_current(QuestionIndex::new(1));
    local.save_progress(&progress).await.unwrap();

    let exclusions: ExclusionSet = [QuestionIndex::new(2)].into_iter().collect();
    local.save_exclusions(&exclusions).await.unwrap();

    let mistake = MistakeRecord::from_submission(
        UserId::new("user-1"),
        QuestionIndex::new(1),
        &question,
        &wrong,
        fixed_now(),
    );
    local.save_mistake_queue(&[mistake.clone()]).await.unwrap();

    assert_eq!(local.load_progress().await.unwrap(), progress);
    assert_eq!(local.load_exclusions().await.unwrap(), exclusions);
    assert_eq!(local.load_mistake_queue().await.unwrap(), vec![mistake]);
    assert_eq!(
        repo.get(keys::CURRENT_INDEX).await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn storage_sqlite_constructor_migrates() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_ctor?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.set("a", "b").await.unwrap();
    assert_eq!(storage.kv.get("a").await.unwrap().as_deref(), Some("b"));
}
