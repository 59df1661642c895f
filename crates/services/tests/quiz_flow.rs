use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use quiz_core::model::{
    MistakeRecord, Question, QuestionBank, QuestionIndex, SelectionRecord, SubmitOutcome, UserId,
};
use quiz_core::navigation::NavigationError;
use quiz_core::time::{fixed_clock, fixed_now};
use services::{
    InMemoryRemoteStore, LocalIdentity, QuizServices, QuizSession, QuizSessionError, RemoteStore,
    SessionMode, SessionStatus, SyncConfig,
};
use storage::Storage;

fn idx(i: usize) -> QuestionIndex {
    QuestionIndex::new(i)
}

fn yes_no() -> Question {
    Question::new(
        "Is the sky blue?",
        vec!["A. Yes".into(), "B. No".into()],
        "A",
    )
}

fn pick_two() -> Question {
    Question::new(
        "Pick the primes",
        vec!["A. 2".into(), "B. 4".into(), "C. 5".into()],
        "A, C",
    )
}

fn bank(questions: Vec<Question>) -> Arc<QuestionBank> {
    Arc::new(QuestionBank::new(questions).unwrap())
}

async fn services_on(
    storage: Storage,
    remote: &InMemoryRemoteStore,
    user: Option<&str>,
) -> QuizServices {
    QuizServices::new(
        storage,
        Arc::new(remote.clone()),
        Arc::new(LocalIdentity::new(user.map(UserId::new))),
        fixed_clock(),
        SyncConfig::default(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn wrong_single_select_answer_queues_one_mistake() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    let mut session = QuizSession::open(bank(vec![yes_no()]), &services, SessionMode::Standard)
        .await
        .unwrap();

    session.click(1).await.unwrap();
    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Graded { correct: false });

    let snapshot = session.snapshot();
    assert!(!snapshot.multi_select);
    assert_eq!(snapshot.record.is_correct(), Some(false));
    assert_eq!(snapshot.counts.incorrect, 1);
    assert_eq!(services.sync().pending().await.unwrap(), 1);

    // Submitting again reports the stored verdict and queues nothing new.
    let again = session.submit().await.unwrap();
    assert_eq!(again, SubmitOutcome::AlreadyAnswered { correct: false });
    assert_eq!(services.sync().pending().await.unwrap(), 1);

    // Clicks after answering change nothing.
    session.click(0).await.unwrap();
    assert!(session.snapshot().record.is_selected(1));
    assert!(!session.snapshot().record.is_selected(0));

    services.sync().flush().await.unwrap();
    let sent = remote.mistakes();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].question_index, idx(0));
    assert_eq!(sent[0].wrong_answer, "B. No");
    assert_eq!(sent[0].question_snippet, "Is the sky blue?...");
    assert_eq!(sent[0].created_at, fixed_now());
}

#[tokio::test]
async fn partial_multi_select_is_wrong_and_full_is_right() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    let mut session = QuizSession::open(
        bank(vec![pick_two(), pick_two()]),
        &services,
        SessionMode::Standard,
    )
    .await
    .unwrap();
    assert!(session.snapshot().multi_select);

    session.click(0).await.unwrap();
    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Graded { correct: false }
    );

    session.next().await.unwrap();
    session.click(2).await.unwrap();
    session.click(1).await.unwrap();
    session.click(0).await.unwrap();
    // Toggling B off again leaves exactly A and C.
    session.click(1).await.unwrap();
    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Graded { correct: true }
    );

    let counts = session.counts();
    assert_eq!((counts.answered, counts.correct, counts.incorrect), (2, 1, 1));
    assert_eq!(services.sync().pending().await.unwrap(), 1);
}

#[tokio::test]
async fn submit_without_selection_is_rejected() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    let mut session = QuizSession::open(bank(vec![yes_no()]), &services, SessionMode::Standard)
        .await
        .unwrap();

    assert!(matches!(
        session.submit().await,
        Err(QuizSessionError::Answer(_))
    ));
    assert_eq!(session.snapshot().record, SelectionRecord::new());
    assert_eq!(services.sync().pending().await.unwrap(), 0);
}

#[tokio::test]
async fn anonymous_mistakes_are_not_reported() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, None).await;
    let mut session = QuizSession::open(bank(vec![yes_no()]), &services, SessionMode::Standard)
        .await
        .unwrap();

    session.click(1).await.unwrap();
    session.submit().await.unwrap();
    assert_eq!(services.sync().pending().await.unwrap(), 0);
    assert_eq!(session.counts().incorrect, 1);
}

#[tokio::test]
async fn excluding_the_current_question_moves_past_it() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, None).await;
    let mut session = QuizSession::open(
        bank(vec![yes_no(), yes_no(), yes_no()]),
        &services,
        SessionMode::Standard,
    )
    .await
    .unwrap();

    session.next().await.unwrap();
    assert!(session.exclude_current().await.unwrap());
    assert_eq!(session.current_index(), idx(2));

    assert_eq!(session.prev().await.unwrap(), idx(0));
    assert_eq!(session.next().await.unwrap(), idx(2));
    assert!(!session.snapshot().can_next);

    let hidden: Vec<_> = session
        .excluded_questions()
        .into_iter()
        .map(|(index, _)| index)
        .collect();
    assert_eq!(hidden, vec![idx(1)]);

    assert!(session.restore(idx(1)).await.unwrap());
    assert_eq!(session.prev().await.unwrap(), idx(1));
}

#[tokio::test]
async fn excluding_the_last_question_stays_put() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, None).await;
    let mut session = QuizSession::open(
        bank(vec![yes_no(), yes_no()]),
        &services,
        SessionMode::Standard,
    )
    .await
    .unwrap();

    session.next().await.unwrap();
    session.exclude_current().await.unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, idx(1));
    assert!(snapshot.is_excluded);
    assert!(snapshot.can_prev);
}

#[tokio::test]
async fn progress_and_exclusions_survive_a_restart() {
    let storage = Storage::in_memory();
    let remote = InMemoryRemoteStore::new();
    let questions = bank(vec![yes_no(), pick_two(), yes_no(), yes_no()]);

    {
        let services = services_on(storage.clone(), &remote, None).await;
        let mut session =
            QuizSession::open(Arc::clone(&questions), &services, SessionMode::Standard)
                .await
                .unwrap();
        session.click(0).await.unwrap();
        session.submit().await.unwrap();
        session.next().await.unwrap();
        session.click(2).await.unwrap();
        session.exclude(idx(2)).await.unwrap();
    }

    let services = services_on(storage, &remote, None).await;
    let session = QuizSession::open(questions, &services, SessionMode::Standard)
        .await
        .unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, idx(1));
    assert!(snapshot.record.is_selected(2));
    assert!(!snapshot.record.is_answered());
    assert_eq!(snapshot.excluded_count, 1);
    assert_eq!(session.counts().correct, 1);
}

#[tokio::test]
async fn resume_skips_a_question_excluded_since() {
    let storage = Storage::in_memory();
    let remote = InMemoryRemoteStore::new();
    let questions = bank(vec![yes_no(), yes_no(), yes_no()]);

    {
        let services = services_on(storage.clone(), &remote, None).await;
        let mut session =
            QuizSession::open(Arc::clone(&questions), &services, SessionMode::Standard)
                .await
                .unwrap();
        session.next().await.unwrap();
        // Exclude through the ledger alone so the saved position stays on 1.
        let mut ledger = services::ExclusionLedger::load(services.local_state())
            .await
            .unwrap();
        ledger.exclude(idx(1)).await.unwrap();
    }

    let services = services_on(storage, &remote, None).await;
    let session = QuizSession::open(questions, &services, SessionMode::Standard)
        .await
        .unwrap();
    assert_eq!(session.current_index(), idx(2));
}

#[tokio::test]
async fn restore_all_needs_confirmation() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, None).await;
    let mut session = QuizSession::open(
        bank(vec![yes_no(), yes_no(), yes_no()]),
        &services,
        SessionMode::Standard,
    )
    .await
    .unwrap();
    session.exclude(idx(1)).await.unwrap();
    session.exclude(idx(2)).await.unwrap();

    assert!(!session.restore_all(|_| false).await);
    assert_eq!(session.snapshot().excluded_count, 2);
    assert!(session.restore_all(|count| count == 2).await);
    assert_eq!(session.snapshot().excluded_count, 0);
}

#[tokio::test]
async fn review_mode_walks_previous_mistakes_only() {
    let remote = InMemoryRemoteStore::new();
    let user = UserId::new("u1");
    let past: Vec<MistakeRecord> = [3, 1, 9]
        .into_iter()
        .enumerate()
        .map(|(n, i)| MistakeRecord {
            user_id: user.clone(),
            question_index: idx(i),
            question_snippet: "Is the sky blue?...".into(),
            wrong_answer: "B. No".into(),
            created_at: fixed_now() + TimeDelta::minutes(i64::try_from(n).unwrap()),
        })
        .collect();
    remote.insert_mistakes(&past).await.unwrap();

    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    let questions = bank(vec![yes_no(); 5]);
    let mut session = QuizSession::open(questions, &services, SessionMode::Review)
        .await
        .unwrap();

    assert_eq!(session.snapshot().status, SessionStatus::Loading);
    assert!(session.snapshot().question.is_none());
    assert!(matches!(
        session.next().await,
        Err(QuizSessionError::Navigation(NavigationError::Loading))
    ));

    // Index 9 is beyond the bank and is ignored.
    assert_eq!(session.load_review().await, 2);
    assert_eq!(session.current_index(), idx(1));

    // Exclusions do not apply while reviewing.
    session.exclude(idx(3)).await.unwrap();
    assert_eq!(session.next().await.unwrap(), idx(3));
    assert!(!session.snapshot().can_next);
    assert_eq!(session.prev().await.unwrap(), idx(1));
}

#[tokio::test]
async fn review_without_mistakes_has_nothing_to_show() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, None).await;
    let mut session = QuizSession::open(bank(vec![yes_no()]), &services, SessionMode::Review)
        .await
        .unwrap();

    assert_eq!(session.load_review().await, 0);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::NothingToReview);
    assert!(!snapshot.can_next && !snapshot.can_prev);
    assert!(matches!(
        session.click(0).await,
        Err(QuizSessionError::Navigation(NavigationError::NothingToReview))
    ));
}

#[tokio::test]
async fn failed_review_fetch_falls_back_to_empty() {
    let remote = InMemoryRemoteStore::new();
    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    remote.set_failing(true);
    let mut session = QuizSession::open(bank(vec![yes_no()]), &services, SessionMode::Review)
        .await
        .unwrap();

    assert_eq!(session.load_review().await, 0);
    assert_eq!(session.snapshot().status, SessionStatus::NothingToReview);
}

#[tokio::test]
async fn sqlite_backed_session_round_trip() {
    let remote = InMemoryRemoteStore::new();
    let identity = Arc::new(LocalIdentity::new(Some(UserId::new("u1"))));
    let questions = bank(vec![yes_no(), yes_no()]);

    let services = QuizServices::new_sqlite(
        "sqlite:file:memdb_quiz_flow?mode=memory&cache=shared",
        Arc::new(remote.clone()),
        identity,
        fixed_clock(),
    )
    .await
    .unwrap();
    {
        let mut session =
            QuizSession::open(Arc::clone(&questions), &services, SessionMode::Standard)
                .await
                .unwrap();
        session.click(1).await.unwrap();
        session.submit().await.unwrap();
        session.next().await.unwrap();
    }

    let session = QuizSession::open(questions, &services, SessionMode::Standard)
        .await
        .unwrap();
    assert_eq!(session.current_index(), idx(1));
    assert_eq!(session.counts().incorrect, 1);
    assert_eq!(services.sync().pending().await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn submitting_never_waits_for_a_slow_remote() {
    let remote = InMemoryRemoteStore::new().with_latency(Duration::from_secs(30));
    let services = services_on(Storage::in_memory(), &remote, Some("u1")).await;
    let questions = bank(vec![yes_no(); 5]);
    let mut session = QuizSession::open(questions, &services, SessionMode::Standard)
        .await
        .unwrap();

    // The fifth wrong answer fills a batch and triggers a flush.
    for i in 0..5 {
        session.click(1).await.unwrap();
        let started = tokio::time::Instant::now();
        let outcome = session.submit().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO, "submit {i} waited");
        assert_eq!(outcome, SubmitOutcome::Graded { correct: false });
        if i < 4 {
            session.next().await.unwrap();
        }
    }
    assert_eq!(services.sync().pending().await.unwrap(), 5);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(remote.mistakes().len(), 5);
    assert_eq!(services.sync().pending().await.unwrap(), 0);
}
