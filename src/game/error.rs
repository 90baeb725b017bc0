use thiserror::Error;

use crate::dictionary::SourceError;
use crate::game::store::StoreError;

/// Failure conditions of the game-session operations, matched by kind.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("validation error: {field}: {rule}")]
    Validation { field: &'static str, rule: String },
    #[error("not enough candidate words to build a session")]
    InsufficientWords,
    #[error("session {session_id} not found")]
    SessionNotFound { session_id: i64 },
    #[error("question {question_id} not found")]
    QuestionNotFound { question_id: i64 },
    #[error("question {question_id} does not belong to session {session_id}")]
    QuestionNotInSession { question_id: i64, session_id: i64 },
    #[error("option {option_id} does not belong to question {question_id}")]
    OptionNotFound { option_id: i64, question_id: i64 },
    #[error("answer for question {question_id} already submitted")]
    AnswerAlreadySubmitted { question_id: i64 },
    #[error("session {session_id} is not owned by the requesting user")]
    Forbidden { session_id: i64 },
    #[error("question generation timed out")]
    Timeout,
    #[error("question generation failed: {0}")]
    Generation(#[source] SourceError),
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

impl GameError {
    pub(crate) fn from_store(err: StoreError, question_id: i64) -> Self {
        match err {
            StoreError::DuplicateAnswer => GameError::AnswerAlreadySubmitted { question_id },
            other => GameError::Storage(other),
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        GameError::Storage(err)
    }
}
