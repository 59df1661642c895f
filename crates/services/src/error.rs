//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AnswerError, QuestionBankError};
use quiz_core::navigation::NavigationError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors returned by a `RemoteStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    /// The row already exists (unique constraint). Callers logging
    /// idempotent effects treat this as success.
    #[error("record already exists")]
    AlreadyExists,
    #[error("remote store is not configured")]
    Disabled,
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("remote store request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected remote response: {0}")]
    InvalidResponse(String),
}

/// Errors returned by an `IdentityProvider`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by the mistake queue and sync manager.
///
/// Remote failures are never surfaced here; they only re-arm the retry timer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Bank(#[from] QuestionBankError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("question {0} is not in the bank")]
    UnknownQuestion(usize),
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}
