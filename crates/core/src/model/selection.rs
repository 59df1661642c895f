use std::collections::BTreeSet;

use thiserror::Error;

use crate::grader;
use crate::model::question::{Question, SelectionMode};

/// Errors raised by user actions on a single question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("select at least one option before submitting")]
    NothingSelected,

    #[error("option {option} does not exist (question has {available} options)")]
    OptionOutOfRange { option: usize, available: usize },

    #[error("study-mode questions are revealed, not submitted")]
    StudyModeQuestion,

    #[error("only study-mode questions can be revealed")]
    NotStudyMode,

    #[error("persisted record is answered={is_answered} but is_correct={is_correct:?}")]
    InconsistentRecord {
        is_answered: bool,
        is_correct: Option<bool>,
    },
}

/// Per-question answer state for one session.
///
/// `verdict` is `None` while unanswered; once set it never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRecord {
    selected: BTreeSet<usize>,
    verdict: Option<bool>,
}

/// What a submit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The record moved to Answered with this verdict.
    Graded { correct: bool },
    /// The record was already answered; nothing changed.
    AlreadyAnswered { correct: bool },
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_correct(self) -> bool {
        match self {
            SubmitOutcome::Graded { correct } | SubmitOutcome::AlreadyAnswered { correct } => {
                correct
            }
        }
    }

    /// True only for the submit that performed the grading.
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, SubmitOutcome::Graded { .. })
    }
}

impl SelectionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a record from its persisted shape.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InconsistentRecord` if `is_correct` is present
    /// without `is_answered` or vice versa.
    pub fn from_persisted(
        selected: BTreeSet<usize>,
        is_answered: bool,
        is_correct: Option<bool>,
    ) -> Result<Self, AnswerError> {
        match (is_answered, is_correct) {
            (true, Some(v)) => Ok(Self {
                selected,
                verdict: Some(v),
            }),
            (false, None) => Ok(Self {
                selected,
                verdict: None,
            }),
            _ => Err(AnswerError::InconsistentRecord {
                is_answered,
                is_correct,
            }),
        }
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, option: usize) -> bool {
        self.selected.contains(&option)
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.verdict.is_some()
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.verdict
    }

    /// Apply a click on `option`, returning the new record.
    ///
    /// Single-select replaces the selection, multi-select toggles membership.
    /// Clicking an answered record returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::OptionOutOfRange` if the question has no such option.
    pub fn with_click(&self, question: &Question, option: usize) -> Result<Self, AnswerError> {
        if self.is_answered() {
            return Ok(self.clone());
        }
        if option >= question.options.len() {
            return Err(AnswerError::OptionOutOfRange {
                option,
                available: question.options.len(),
            });
        }

        let mut next = self.clone();
        match question.selection_mode() {
            SelectionMode::Multi => {
                if !next.selected.remove(&option) {
                    next.selected.insert(option);
                }
            }
            SelectionMode::Single | SelectionMode::Study => {
                next.selected.clear();
                next.selected.insert(option);
            }
        }
        Ok(next)
    }

    /// Grade the current selection, returning the new record and what happened.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::NothingSelected` when nothing is selected and
    /// `AnswerError::StudyModeQuestion` for questions without options.
    pub fn submit(&self, question: &Question) -> Result<(Self, SubmitOutcome), AnswerError> {
        if let Some(correct) = self.verdict {
            return Ok((self.clone(), SubmitOutcome::AlreadyAnswered { correct }));
        }
        if question.is_study_mode() {
            return Err(AnswerError::StudyModeQuestion);
        }
        if self.selected.is_empty() {
            return Err(AnswerError::NothingSelected);
        }

        let correct = grader::grade(question, &self.selected);
        let next = Self {
            selected: self.selected.clone(),
            verdict: Some(correct),
        };
        Ok((next, SubmitOutcome::Graded { correct }))
    }

    /// Reveal a study-mode question.
    ///
    /// Marks the record answered and correct with an empty selection, so
    /// ungradeable questions never produce mistakes. An answered record is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::NotStudyMode` if the question has options.
    pub fn reveal(&self, question: &Question) -> Result<Self, AnswerError> {
        if !question.is_study_mode() {
            return Err(AnswerError::NotStudyMode);
        }
        if self.is_answered() {
            return Ok(self.clone());
        }
        Ok(Self {
            selected: BTreeSet::new(),
            verdict: Some(true),
        })
    }
}
