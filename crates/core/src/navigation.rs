//! Prev/next movement over the question bank.
//!
//! Standard mode walks every question except excluded ones. Review mode walks
//! only a filter set (for example previously missed questions) and ignores
//! exclusions. The filter arrives asynchronously, so review mode starts in a
//! loading state where navigation is suspended.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{ExclusionSet, QuestionIndex};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("review questions are still loading")]
    Loading,
    #[error("no questions to review")]
    NothingToReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewFilter {
    Loading,
    Ready(BTreeSet<QuestionIndex>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorMode {
    Standard,
    Review(ReviewFilter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Cursor over a bank of `len` questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCursor {
    len: usize,
    current: QuestionIndex,
    mode: CursorMode,
}

impl NavigationCursor {
    /// Standard-mode cursor at `current`, clamped into the bank.
    #[must_use]
    pub fn standard(len: usize, current: QuestionIndex) -> Self {
        Self {
            len,
            current: clamp(len, current),
            mode: CursorMode::Standard,
        }
    }

    /// Restore a standard-mode cursor from a persisted index.
    ///
    /// If the restored question has since been excluded the cursor moves
    /// forward once to the next valid question; it never moves backward.
    #[must_use]
    pub fn resume(len: usize, restored: QuestionIndex, exclusions: &ExclusionSet) -> Self {
        Self::standard(len, restored).skip_excluded(exclusions)
    }

    /// Review-mode cursor waiting for its filter set.
    #[must_use]
    pub fn review(len: usize) -> Self {
        Self {
            len,
            current: QuestionIndex::new(0),
            mode: CursorMode::Review(ReviewFilter::Loading),
        }
    }

    /// Apply a loaded review filter and jump to its first in-bounds index.
    ///
    /// Out-of-bounds indices are dropped. Has no effect in standard mode.
    #[must_use]
    pub fn with_filter(&self, filter: impl IntoIterator<Item = QuestionIndex>) -> Self {
        if !matches!(self.mode, CursorMode::Review(_)) {
            return self.clone();
        }
        let len = self.len;
        let set: BTreeSet<QuestionIndex> = filter
            .into_iter()
            .filter(|i| i.value() < len)
            .collect();
        let current = set.first().copied().unwrap_or(QuestionIndex::new(0));
        Self {
            len,
            current,
            mode: CursorMode::Review(ReviewFilter::Ready(set)),
        }
    }

    #[must_use]
    pub fn current(&self) -> QuestionIndex {
        self.current
    }

    #[must_use]
    pub fn mode(&self) -> &CursorMode {
        &self.mode
    }

    #[must_use]
    pub fn is_review(&self) -> bool {
        matches!(self.mode, CursorMode::Review(_))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.mode, CursorMode::Review(ReviewFilter::Loading))
    }

    /// Checks that the cursor points at a question that can be shown.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Loading` while the review filter is pending and
    /// `NavigationError::NothingToReview` when it loaded empty.
    pub fn ensure_ready(&self) -> Result<(), NavigationError> {
        match &self.mode {
            CursorMode::Standard => Ok(()),
            CursorMode::Review(ReviewFilter::Loading) => Err(NavigationError::Loading),
            CursorMode::Review(ReviewFilter::Ready(set)) if set.is_empty() => {
                Err(NavigationError::NothingToReview)
            }
            CursorMode::Review(ReviewFilter::Ready(_)) => Ok(()),
        }
    }

    fn is_valid(&self, index: QuestionIndex, exclusions: &ExclusionSet) -> bool {
        if index.value() >= self.len {
            return false;
        }
        match &self.mode {
            CursorMode::Standard => !exclusions.contains(index),
            CursorMode::Review(ReviewFilter::Ready(set)) => set.contains(&index),
            CursorMode::Review(ReviewFilter::Loading) => false,
        }
    }

    fn scan(&self, direction: Direction, exclusions: &ExclusionSet) -> Option<QuestionIndex> {
        let start = self.current.value();
        match direction {
            Direction::Forward => (start + 1..self.len)
                .map(QuestionIndex::new)
                .find(|&i| self.is_valid(i, exclusions)),
            Direction::Backward => (0..start.min(self.len))
                .rev()
                .map(QuestionIndex::new)
                .find(|&i| self.is_valid(i, exclusions)),
        }
    }

    fn step(
        &self,
        direction: Direction,
        exclusions: &ExclusionSet,
    ) -> Result<Self, NavigationError> {
        self.ensure_ready()?;
        Ok(match self.scan(direction, exclusions) {
            Some(current) => Self {
                current,
                ..self.clone()
            },
            None => self.clone(),
        })
    }

    /// Cursor after moving forward; unchanged at the end.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` while a review filter is loading or empty.
    pub fn next(&self, exclusions: &ExclusionSet) -> Result<Self, NavigationError> {
        self.step(Direction::Forward, exclusions)
    }

    /// Cursor after moving backward; unchanged at the start.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` while a review filter is loading or empty.
    pub fn prev(&self, exclusions: &ExclusionSet) -> Result<Self, NavigationError> {
        self.step(Direction::Backward, exclusions)
    }

    #[must_use]
    pub fn can_next(&self, exclusions: &ExclusionSet) -> bool {
        self.ensure_ready().is_ok() && self.scan(Direction::Forward, exclusions).is_some()
    }

    #[must_use]
    pub fn can_prev(&self, exclusions: &ExclusionSet) -> bool {
        self.ensure_ready().is_ok() && self.scan(Direction::Backward, exclusions).is_some()
    }

    /// Move forward off the current question if it is excluded.
    ///
    /// Stays put when no later question is available. Review mode ignores exclusions.
    #[must_use]
    pub fn skip_excluded(&self, exclusions: &ExclusionSet) -> Self {
        if self.is_review() || !exclusions.contains(self.current) {
            return self.clone();
        }
        match self.scan(Direction::Forward, exclusions) {
            Some(current) => Self {
                current,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
}

fn clamp(len: usize, index: QuestionIndex) -> QuestionIndex {
    if len == 0 {
        return QuestionIndex::new(0);
    }
    QuestionIndex::new(index.value().min(len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: usize) -> QuestionIndex {
        QuestionIndex::new(i)
    }

    fn excluded(items: &[usize]) -> ExclusionSet {
        items.iter().copied().map(idx).collect()
    }

    #[test]
    fn standard_skips_excluded_both_ways() {
        let ex = excluded(&[1, 2]);
        let cursor = NavigationCursor::standard(5, idx(0));
        let forward = cursor.next(&ex).unwrap();
        assert_eq!(forward.current(), idx(3));
        let back = forward.prev(&ex).unwrap();
        assert_eq!(back.current(), idx(0));
    }

    #[test]
    fn clamps_at_ends() {
        let ex = ExclusionSet::new();
        let first = NavigationCursor::standard(3, idx(0));
        assert!(!first.can_prev(&ex));
        assert_eq!(first.prev(&ex).unwrap().current(), idx(0));

        let last = NavigationCursor::standard(3, idx(2));
        assert!(!last.can_next(&ex));
        assert_eq!(last.next(&ex).unwrap().current(), idx(2));
    }

    #[test]
    fn trailing_exclusions_disable_next() {
        let ex = excluded(&[3, 4]);
        let cursor = NavigationCursor::standard(5, idx(2));
        assert!(!cursor.can_next(&ex));
    }

    #[test]
    fn resume_moves_forward_off_excluded() {
        let ex = excluded(&[1]);
        let cursor = NavigationCursor::resume(3, idx(1), &ex);
        assert_eq!(cursor.current(), idx(2));
    }

    #[test]
    fn resume_never_moves_backward() {
        let ex = excluded(&[2]);
        let cursor = NavigationCursor::resume(3, idx(2), &ex);
        assert_eq!(cursor.current(), idx(2));
    }

    #[test]
    fn resume_clamps_out_of_range_index() {
        let cursor = NavigationCursor::resume(3, idx(40), &ExclusionSet::new());
        assert_eq!(cursor.current(), idx(2));
    }

    #[test]
    fn review_is_suspended_until_loaded() {
        let cursor = NavigationCursor::review(5);
        assert!(cursor.is_loading());
        assert_eq!(
            cursor.next(&ExclusionSet::new()).unwrap_err(),
            NavigationError::Loading
        );
        assert!(!cursor.can_next(&ExclusionSet::new()));
    }

    #[test]
    fn review_walks_filter_and_ignores_exclusions() {
        let ex = excluded(&[3]);
        let cursor = NavigationCursor::review(6).with_filter([idx(3), idx(1), idx(9)]);
        assert_eq!(cursor.current(), idx(1));
        let next = cursor.next(&ex).unwrap();
        assert_eq!(next.current(), idx(3));
        assert!(!next.can_next(&ex));
        assert_eq!(next.skip_excluded(&ex).current(), idx(3));
    }

    #[test]
    fn empty_review_has_nothing_to_show() {
        let cursor = NavigationCursor::review(4).with_filter(Vec::new());
        assert_eq!(
            cursor.ensure_ready().unwrap_err(),
            NavigationError::NothingToReview
        );
    }

    #[test]
    fn filter_is_ignored_in_standard_mode() {
        let cursor = NavigationCursor::standard(4, idx(2)).with_filter([idx(0)]);
        assert_eq!(cursor.current(), idx(2));
        assert!(!cursor.is_review());
    }
}
