use std::collections::BTreeMap;

use crate::model::ids::QuestionIndex;
use crate::model::selection::SelectionRecord;

/// Aggregated counters for a session, useful for headers and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressCounts {
    pub answered: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// Per-question selection records plus the cursor position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    records: BTreeMap<QuestionIndex, SelectionRecord>,
    current: QuestionIndex,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(
        records: BTreeMap<QuestionIndex, SelectionRecord>,
        current: QuestionIndex,
    ) -> Self {
        Self { records, current }
    }

    #[must_use]
    pub fn current(&self) -> QuestionIndex {
        self.current
    }

    #[must_use]
    pub fn records(&self) -> &BTreeMap<QuestionIndex, SelectionRecord> {
        &self.records
    }

    /// Record for `index`, or a fresh unanswered one.
    #[must_use]
    pub fn record(&self, index: QuestionIndex) -> SelectionRecord {
        self.records.get(&index).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn with_current(mut self, current: QuestionIndex) -> Self {
        self.current = current;
        self
    }

    #[must_use]
    pub fn with_record(mut self, index: QuestionIndex, record: SelectionRecord) -> Self {
        self.records.insert(index, record);
        self
    }

    #[must_use]
    pub fn counts(&self) -> ProgressCounts {
        self.records
            .values()
            .fold(ProgressCounts::default(), |mut acc, r| {
                match r.is_correct() {
                    Some(true) => {
                        acc.answered += 1;
                        acc.correct += 1;
                    }
                    Some(false) => {
                        acc.answered += 1;
                        acc.incorrect += 1;
                    }
                    None => {}
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    #[test]
    fn counts_only_answered_records() {
        let q = Question::new("Q", vec!["A. a".into(), "B. b".into()], "A");
        let pending = SelectionRecord::new().with_click(&q, 0).unwrap();
        let (right, _) = pending.submit(&q).unwrap();
        let (wrong, _) = SelectionRecord::new()
            .with_click(&q, 1)
            .unwrap()
            .submit(&q)
            .unwrap();

        let state = ProgressState::new()
            .with_record(QuestionIndex::new(0), right)
            .with_record(QuestionIndex::new(1), wrong)
            .with_record(QuestionIndex::new(2), pending);

        let counts = state.counts();
        assert_eq!(counts.answered, 2);
        assert_eq!(counts.correct, 1);
        assert_eq!(counts.incorrect, 1);
    }

    #[test]
    fn missing_record_is_fresh() {
        let state = ProgressState::new();
        assert!(!state.record(QuestionIndex::new(9)).is_answered());
    }

    #[test]
    fn fresh_state_starts_at_the_first_question() {
        let state = ProgressState::new();
        assert_eq!(state.current(), QuestionIndex::new(0));
        assert!(state.records().is_empty());
        assert_eq!(state, ProgressState::default());
    }
}
