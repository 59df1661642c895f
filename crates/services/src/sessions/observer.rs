use quiz_core::model::QuestionIndex;

use super::view::SessionSnapshot;

/// State change reported to observers after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionEvent {
    Opened,
    ReviewLoaded { questions: usize },
    SelectionChanged { index: QuestionIndex },
    Answered { index: QuestionIndex, correct: bool },
    Revealed { index: QuestionIndex },
    Navigated { from: QuestionIndex, to: QuestionIndex },
    Excluded { index: QuestionIndex },
    Restored { index: QuestionIndex },
    RestoredAll { count: usize },
}

/// Callback contract for whatever presents a session.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent, snapshot: &SessionSnapshot);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent, &SessionSnapshot) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent, snapshot: &SessionSnapshot) {
        self(event, snapshot);
    }
}
