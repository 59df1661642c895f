use thiserror::Error;

use crate::model::{AnswerError, QuestionBankError};
use crate::navigation::NavigationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
