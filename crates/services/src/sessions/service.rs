use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    MistakeRecord, ProgressCounts, Question, QuestionBank, QuestionIndex, SelectionMode,
    SelectionRecord, SubmitOutcome,
};
use quiz_core::navigation::{CursorMode, NavigationCursor, NavigationError, ReviewFilter};
use storage::repository::StorageError;
use tracing::{debug, info, warn};

use super::observer::{SessionEvent, SessionObserver};
use super::view::{SessionSnapshot, SessionStatus};
use crate::app_services::QuizServices;
use crate::error::QuizSessionError;
use crate::exclusion_service::ExclusionLedger;
use crate::identity::IdentityProvider;
use crate::progress_service::ProgressStore;
use crate::remote::RemoteStore;
use crate::sync::MistakeSyncManager;

/// How a session walks the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Every question except excluded ones, resuming where the user left off.
    Standard,
    /// Only questions the user previously got wrong.
    Review,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz session over a question bank.
///
/// Every mutation is written through to local persistence before observers
/// are notified. A failed write is logged and the session carries on with
/// its in-memory state.
pub struct QuizSession {
    bank: Arc<QuestionBank>,
    clock: Clock,
    identity: Arc<dyn IdentityProvider>,
    remote: Arc<dyn RemoteStore>,
    sync: MistakeSyncManager,
    progress: ProgressStore,
    exclusions: ExclusionLedger,
    cursor: NavigationCursor,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl QuizSession {
    /// Restore saved progress and exclusions and position the cursor.
    ///
    /// In standard mode a restored question that has since been excluded is
    /// skipped forward. Review mode starts loading; call `load_review` or
    /// `apply_review_filter` to make it navigable.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Storage` if saved state cannot be read.
    pub async fn open(
        bank: Arc<QuestionBank>,
        services: &QuizServices,
        mode: SessionMode,
    ) -> Result<Self, QuizSessionError> {
        let local = services.local_state();
        let progress = ProgressStore::load(local.clone()).await?;
        let exclusions = ExclusionLedger::load(local).await?;

        let cursor = match mode {
            SessionMode::Standard => {
                NavigationCursor::resume(bank.len(), progress.state().current(), exclusions.set())
            }
            SessionMode::Review => NavigationCursor::review(bank.len()),
        };

        let mut session = Self {
            bank,
            clock: services.clock(),
            identity: services.identity(),
            remote: services.remote(),
            sync: services.sync(),
            progress,
            exclusions,
            cursor,
            observers: Vec::new(),
        };
        let moved_on_open = session.cursor.current() != session.progress.state().current();
        if mode == SessionMode::Standard && moved_on_open {
            session.persist_current().await;
        }

        info!(
            ?mode,
            questions = session.bank.len(),
            current = %session.cursor.current(),
            excluded = session.exclusions.set().len(),
            "quiz session opened"
        );
        Ok(session)
    }

    /// Register an observer. It is told about the current state immediately.
    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        let observer: Arc<dyn SessionObserver> = Arc::new(observer);
        observer.on_event(&SessionEvent::Opened, &self.snapshot());
        self.observers.push(observer);
    }

    //
    // ─── REVIEW ────────────────────────────────────────────────────────────────
    //

    /// Fetch the signed-in user's previously missed questions and apply them.
    ///
    /// An anonymous user or a failed fetch yields an empty review set.
    /// Returns the number of questions available for review.
    pub async fn load_review(&mut self) -> usize {
        let user = match self.identity.current_user().await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "identity lookup failed");
                None
            }
        };
        let indices = match user {
            Some(user) => match self.remote.mistake_indices(&user).await {
                Ok(indices) => indices,
                Err(err) => {
                    warn!(user = %user, error = %err, "review questions unavailable");
                    Default::default()
                }
            },
            None => {
                debug!("anonymous user has nothing to review");
                Default::default()
            }
        };
        self.apply_review_filter(indices)
    }

    /// Finish loading review mode with `indices`.
    ///
    /// Indices outside the bank are ignored. Has no effect in standard mode.
    /// Returns the number of questions available for review.
    pub fn apply_review_filter(
        &mut self,
        indices: impl IntoIterator<Item = QuestionIndex>,
    ) -> usize {
        if !self.cursor.is_review() {
            return 0;
        }
        self.cursor = self.cursor.with_filter(indices);
        let questions = match self.cursor.mode() {
            CursorMode::Review(ReviewFilter::Ready(set)) => set.len(),
            _ => 0,
        };
        info!(questions, "review questions loaded");
        self.notify(&SessionEvent::ReviewLoaded { questions });
        questions
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Toggle option `option` on the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError` while navigation is suspended or when the
    /// option does not exist.
    pub async fn click(&mut self, option: usize) -> Result<(), QuizSessionError> {
        let (index, question) = self.current_question()?;
        let before = self.progress.record(index);
        let after = before.with_click(&question, option)?;
        if after == before {
            return Ok(());
        }
        self.put_record(index, after).await;
        self.notify(&SessionEvent::SelectionChanged { index });
        Ok(())
    }

    /// Grade the current selection.
    ///
    /// A wrong answer from a signed-in user queues exactly one mistake record.
    /// Submitting an answered question returns its verdict and does nothing else.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Answer` when nothing is selected or the
    /// question is study-mode.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, QuizSessionError> {
        let (index, question) = self.current_question()?;
        let (record, outcome) = self.progress.record(index).submit(&question)?;
        let SubmitOutcome::Graded { correct } = outcome else {
            return Ok(outcome);
        };

        self.put_record(index, record.clone()).await;
        info!(%index, correct, "answer submitted");
        if !correct {
            self.report_mistake(index, &question, &record).await;
        }
        self.notify(&SessionEvent::Answered { index, correct });
        Ok(outcome)
    }

    /// Show the answer of a study-mode question, marking it answered.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Answer` if the question has options.
    pub async fn reveal(&mut self) -> Result<(), QuizSessionError> {
        let (index, question) = self.current_question()?;
        let before = self.progress.record(index);
        let after = before.reveal(&question)?;
        if after == before {
            return Ok(());
        }
        self.put_record(index, after).await;
        self.notify(&SessionEvent::Revealed { index });
        Ok(())
    }

    async fn report_mistake(
        &self,
        index: QuestionIndex,
        question: &Question,
        record: &SelectionRecord,
    ) {
        let user = match self.identity.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(%index, "anonymous mistake not reported");
                return;
            }
            Err(err) => {
                warn!(%index, error = %err, "identity lookup failed; mistake not reported");
                return;
            }
        };
        let mistake =
            MistakeRecord::from_submission(user, index, question, record, self.clock.now());
        if let Err(err) = self.sync.enqueue(mistake).await {
            warn!(%index, error = %err, "mistake could not be queued");
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next valid question. Stays put at the end.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Navigation` while review questions are
    /// loading or when there is nothing to review.
    pub async fn next(&mut self) -> Result<QuestionIndex, QuizSessionError> {
        let moved = self.cursor.next(self.exclusions.set())?;
        self.move_to(moved).await;
        Ok(self.cursor.current())
    }

    /// Move to the previous valid question. Stays put at the start.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Navigation` while review questions are
    /// loading or when there is nothing to review.
    pub async fn prev(&mut self) -> Result<QuestionIndex, QuizSessionError> {
        let moved = self.cursor.prev(self.exclusions.set())?;
        self.move_to(moved).await;
        Ok(self.cursor.current())
    }

    async fn move_to(&mut self, cursor: NavigationCursor) {
        let from = self.cursor.current();
        self.cursor = cursor;
        let to = self.cursor.current();
        if from == to {
            return;
        }
        self.persist_current().await;
        self.notify(&SessionEvent::Navigated { from, to });
    }

    //
    // ─── EXCLUSIONS ────────────────────────────────────────────────────────────
    //

    /// Exclude the question on screen and move past it.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Navigation` if no question is on screen.
    pub async fn exclude_current(&mut self) -> Result<bool, QuizSessionError> {
        self.cursor.ensure_ready()?;
        self.exclude(self.cursor.current()).await
    }

    /// Remove `index` from rotation. Returns false if it was already excluded.
    ///
    /// If it is the current question the cursor advances to the next valid
    /// question; with none left it stays put.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::UnknownQuestion` for indices outside the bank.
    pub async fn exclude(&mut self, index: QuestionIndex) -> Result<bool, QuizSessionError> {
        self.ensure_in_bank(index)?;
        let changed = persisted_change(self.exclusions.exclude(index).await, "exclude");
        if !changed {
            return Ok(false);
        }
        self.notify(&SessionEvent::Excluded { index });
        let skipped = self.cursor.skip_excluded(self.exclusions.set());
        self.move_to(skipped).await;
        Ok(true)
    }

    /// Put `index` back into rotation. Returns false if it was not excluded.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::UnknownQuestion` for indices outside the bank.
    pub async fn restore(&mut self, index: QuestionIndex) -> Result<bool, QuizSessionError> {
        self.ensure_in_bank(index)?;
        let changed = persisted_change(self.exclusions.restore(index).await, "restore");
        if changed {
            self.notify(&SessionEvent::Restored { index });
        }
        Ok(changed)
    }

    /// Restore every excluded question once `confirm` approves.
    ///
    /// `confirm` receives the number of excluded questions.
    pub async fn restore_all(&mut self, confirm: impl FnOnce(usize) -> bool) -> bool {
        let count = self.exclusions.set().len();
        let changed = persisted_change(self.exclusions.restore_all(confirm).await, "restore all");
        if changed {
            self.notify(&SessionEvent::RestoredAll { count });
        }
        changed
    }

    /// Excluded questions in bank order, for the "other bank" view.
    #[must_use]
    pub fn excluded_questions(&self) -> Vec<(QuestionIndex, &Question)> {
        self.exclusions
            .excluded()
            .into_iter()
            .filter_map(|index| self.bank.get(index).map(|q| (index, q)))
            .collect()
    }

    //
    // ─── VIEW ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn current_index(&self) -> QuestionIndex {
        self.cursor.current()
    }

    #[must_use]
    pub fn is_review(&self) -> bool {
        self.cursor.is_review()
    }

    #[must_use]
    pub fn counts(&self) -> ProgressCounts {
        self.progress.state().counts()
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Presentation-ready view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let index = self.cursor.current();
        let exclusions = self.exclusions.set();
        let status = match self.cursor.ensure_ready() {
            Ok(()) => SessionStatus::Ready,
            Err(NavigationError::Loading) => SessionStatus::Loading,
            Err(_) => SessionStatus::NothingToReview,
        };
        let question = match status {
            SessionStatus::Ready => self.bank.get(index).cloned(),
            SessionStatus::Loading | SessionStatus::NothingToReview => None,
        };
        let multi_select = question
            .as_ref()
            .is_some_and(|q| q.selection_mode() == SelectionMode::Multi);

        SessionSnapshot {
            status,
            review: self.cursor.is_review(),
            index,
            total: self.bank.len(),
            question,
            record: self.progress.record(index),
            multi_select,
            can_next: self.cursor.can_next(exclusions),
            can_prev: self.cursor.can_prev(exclusions),
            is_excluded: self.exclusions.is_excluded(index),
            excluded_count: exclusions.len(),
            counts: self.counts(),
        }
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn current_question(&self) -> Result<(QuestionIndex, Question), QuizSessionError> {
        self.cursor.ensure_ready()?;
        let index = self.cursor.current();
        let question = self
            .bank
            .get(index)
            .cloned()
            .ok_or(QuizSessionError::UnknownQuestion(index.value()))?;
        Ok((index, question))
    }

    fn ensure_in_bank(&self, index: QuestionIndex) -> Result<(), QuizSessionError> {
        if self.bank.contains(index) {
            Ok(())
        } else {
            Err(QuizSessionError::UnknownQuestion(index.value()))
        }
    }

    async fn put_record(&mut self, index: QuestionIndex, record: SelectionRecord) {
        if let Err(err) = self.progress.put(index, record).await {
            warn!(%index, error = %err, "progress not saved");
        }
    }

    /// Review mode walks a derived set, so only standard mode saves its position.
    async fn persist_current(&mut self) {
        if self.cursor.is_review() {
            return;
        }
        let index = self.cursor.current();
        if let Err(err) = self.progress.set_current(index).await {
            warn!(%index, error = %err, "current question not saved");
        }
    }

    fn notify(&self, event: &SessionEvent) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &self.observers {
            observer.on_event(event, &snapshot);
        }
    }
}

/// The ledger mutates in memory before writing, so a failed write still
/// reflects a change.
fn persisted_change(result: Result<bool, StorageError>, action: &str) -> bool {
    match result {
        Ok(changed) => changed,
        Err(err) => {
            warn!(action, error = %err, "exclusions not saved");
            true
        }
    }
}
