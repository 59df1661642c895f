use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::answer_key;
use crate::model::ids::QuestionIndex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank is empty")]
    Empty,
}

/// How the user is allowed to select options for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Clicking an option replaces the selection.
    Single,
    /// Clicking an option toggles its membership in the selection.
    Multi,
    /// No options; the answer is revealed instead of graded.
    Study,
}

/// A single question as supplied by the question bank.
///
/// Field names follow the bank's JSON format (`correctAnswer` etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub topic: Option<serde_json::Value>,
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub correct_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Question {
    /// Convenience constructor used by bundled banks and tests.
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            topic: None,
            question: prompt.into(),
            options,
            correct_answer: correct_answer.into(),
            explanation: String::new(),
            kind: None,
        }
    }

    /// Study-mode questions carry no options and cannot be graded.
    #[must_use]
    pub fn is_study_mode(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        if self.is_study_mode() {
            SelectionMode::Study
        } else if answer_key::is_multi_select(&self.correct_answer) {
            SelectionMode::Multi
        } else {
            SelectionMode::Single
        }
    }

    /// Topic rendered as plain text, whether the bank stores it as a number or a string.
    #[must_use]
    pub fn topic_label(&self) -> Option<String> {
        match self.topic.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Banks written by hand use `null` for "no value"; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered, read-only list of questions for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Wrap a list of questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Empty` when there is nothing to show.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: QuestionIndex) -> Option<&Question> {
        self.questions.get(index.value())
    }

    #[must_use]
    pub fn contains(&self, index: QuestionIndex) -> bool {
        index.value() < self.questions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionIndex, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| (QuestionIndex::new(i), q))
    }
}
