use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grader;
use crate::model::ids::{QuestionIndex, UserId};
use crate::model::question::Question;
use crate::model::selection::SelectionRecord;

/// Characters of the prompt kept in a mistake record.
pub const SNIPPET_CHARS: usize = 100;

/// An incorrect answer waiting to be reported to the remote store.
///
/// Serialized field names match the remote `mistakes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub user_id: UserId,
    pub question_index: QuestionIndex,
    #[serde(rename = "question_text")]
    pub question_snippet: String,
    #[serde(rename = "wrong_answer")]
    pub wrong_answer: String,
    pub created_at: DateTime<Utc>,
}

impl MistakeRecord {
    /// Build the record for a wrong submission.
    #[must_use]
    pub fn from_submission(
        user_id: UserId,
        index: QuestionIndex,
        question: &Question,
        record: &SelectionRecord,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_index: index,
            question_snippet: snippet(&question.question),
            wrong_answer: grader::selected_text(question, record.selected()),
            created_at,
        }
    }
}

fn snippet(prompt: &str) -> String {
    let head: String = prompt.chars().take(SNIPPET_CHARS).collect();
    format!("{head}...")
}
