use quiz_core::model::{ProgressCounts, Question, QuestionIndex, SelectionRecord};

/// Whether the session has a question to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Ready,
    /// Review questions are still being fetched.
    Loading,
    /// Review mode loaded an empty set.
    NothingToReview,
}

/// Presentation-agnostic view of a session.
///
/// Carries no formatted strings; the presenter decides how to render
/// positions, verdicts, and explanations. `question` is `None` unless
/// `status` is `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub review: bool,
    pub index: QuestionIndex,
    pub total: usize,
    pub question: Option<Question>,
    pub record: SelectionRecord,
    pub multi_select: bool,
    pub can_next: bool,
    pub can_prev: bool,
    pub is_excluded: bool,
    pub excluded_count: usize,
    pub counts: ProgressCounts,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == SessionStatus::Ready
    }

    #[must_use]
    pub fn is_study_mode(&self) -> bool {
        self.question.as_ref().is_some_and(Question::is_study_mode)
    }
}
