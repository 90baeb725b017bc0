use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::game::model::{
    GameAnswer, GameQuestion, GameQuestionOption, GameSession, NewAnswer, NewOption, NewQuestion,
    NewSession,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// An answer for the (question, session, user) triple already exists.
    /// Raised by the storage uniqueness constraint, which is the
    /// authoritative guard against concurrent duplicate submissions.
    #[error("answer already exists for this question")]
    DuplicateAnswer,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for sessions, questions, options and answers.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn insert_session(&self, session: NewSession) -> Result<GameSession, StoreError>;

    async fn find_session(&self, session_id: i64) -> Result<Option<GameSession>, StoreError>;

    /// Sets the final question count once generation has succeeded.
    async fn update_total_questions(&self, session_id: i64, total: i16) -> Result<(), StoreError>;

    /// Adds one to the session's correct-answer tally.
    async fn increment_correct_questions(&self, session_id: i64) -> Result<(), StoreError>;

    /// Marks a session ended. Idempotent: the first end timestamp wins.
    /// Returns the session as stored afterwards, or None if it doesn't exist.
    async fn end_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<GameSession>, StoreError>;

    /// Writes a session's questions and options in one transaction, so that
    /// consumers listing by session never observe a partial batch. Options
    /// reference their question by `question_order`.
    async fn insert_question_batch(
        &self,
        questions: &[NewQuestion],
        options: &[NewOption],
    ) -> Result<(), StoreError>;

    async fn find_questions_by_session(
        &self,
        session_id: i64,
    ) -> Result<(Vec<GameQuestion>, Vec<GameQuestionOption>), StoreError>;

    async fn find_question_with_options(
        &self,
        question_id: i64,
    ) -> Result<Option<(GameQuestion, Vec<GameQuestionOption>)>, StoreError>;

    async fn insert_answer(&self, answer: NewAnswer) -> Result<GameAnswer, StoreError>;

    async fn find_answer(
        &self,
        question_id: i64,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<GameAnswer>, StoreError>;

    async fn find_answers_by_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Vec<GameAnswer>, StoreError>;
}
