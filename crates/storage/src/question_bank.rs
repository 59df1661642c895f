//! Question-bank loaders: a JSON file on disk or a bundled JSON string.

use std::path::Path;

use quiz_core::model::{Question, QuestionBank, QuestionBankError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Bank(#[from] QuestionBankError),
}

/// Parse a bank from a JSON array of question records.
///
/// # Errors
///
/// Returns `QuestionSourceError::Json` for malformed input and
/// `QuestionSourceError::Bank` when the array is empty.
pub fn from_json_str(raw: &str) -> Result<QuestionBank, QuestionSourceError> {
    let questions: Vec<Question> = serde_json::from_str(raw)?;
    Ok(QuestionBank::new(questions)?)
}

/// Read and parse a bank file.
///
/// # Errors
///
/// Returns `QuestionSourceError` if the file cannot be read or parsed, or is empty.
pub fn from_path(path: &Path) -> Result<QuestionBank, QuestionSourceError> {
    let raw = std::fs::read_to_string(path).map_err(|source| QuestionSourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let bank = from_json_str(&raw)?;
    info!(path = %path.display(), questions = bank.len(), "loaded question bank");
    Ok(bank)
}
