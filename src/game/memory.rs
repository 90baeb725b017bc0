use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::game::model::{
    GameAnswer, GameQuestion, GameQuestionOption, GameSession, NewAnswer, NewOption, NewQuestion,
    NewSession,
};
use crate::game::store::{GameStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    sessions: Vec<GameSession>,
    questions: Vec<GameQuestion>,
    options: Vec<GameQuestionOption>,
    answers: Vec<GameAnswer>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store used by tests and local tooling. Mirrors the Postgres
/// store's semantics, including the answer uniqueness guard.
#[derive(Default)]
pub struct MemoryGameStore {
    inner: Mutex<Inner>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn insert_session(&self, session: NewSession) -> Result<GameSession, StoreError> {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        let stored = GameSession {
            id,
            user_id: session.user_id,
            mode: session.mode,
            source_language_id: session.source_language_id,
            target_language_id: session.target_language_id,
            topic_id: session.topic_id,
            level_id: session.level_id,
            total_questions: 0,
            correct_questions: 0,
            started_at: session.started_at,
            ended_at: None,
        };
        inner.sessions.push(stored.clone());
        Ok(stored)
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<GameSession>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn update_total_questions(&self, session_id: i64, total: i16) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.iter_mut().find(|s| s.id == session_id) {
            session.total_questions = total;
        }
        Ok(())
    }

    async fn increment_correct_questions(&self, session_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.iter_mut().find(|s| s.id == session_id) {
            session.correct_questions += 1;
        }
        Ok(())
    }

    async fn end_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<GameSession>, StoreError> {
        let mut inner = self.inner.lock();
        let Some(session) = inner.sessions.iter_mut().find(|s| s.id == session_id) else {
            return Ok(None);
        };
        if session.ended_at.is_none() {
            session.ended_at = Some(ended_at);
        }
        Ok(Some(session.clone()))
    }

    async fn insert_question_batch(
        &self,
        questions: &[NewQuestion],
        options: &[NewOption],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for question in questions {
            let question_id = inner.next_id();
            inner.questions.push(GameQuestion {
                id: question_id,
                session_id: question.session_id,
                question_order: question.question_order,
                question_type: question.question_type.clone(),
                source_word_id: question.source_word_id,
                correct_target_word_id: question.correct_target_word_id,
                source_language_id: question.source_language_id,
                target_language_id: question.target_language_id,
                prompt_text: question.prompt_text.clone(),
                created_at: Utc::now(),
            });
            for option in options
                .iter()
                .filter(|o| o.question_order == question.question_order)
            {
                let option_id = inner.next_id();
                inner.options.push(GameQuestionOption {
                    id: option_id,
                    question_id,
                    option_label: option.option_label.clone(),
                    target_word_id: option.target_word_id,
                    word_text: option.word_text.clone(),
                    is_correct: option.is_correct,
                });
            }
        }
        Ok(())
    }

    async fn find_questions_by_session(
        &self,
        session_id: i64,
    ) -> Result<(Vec<GameQuestion>, Vec<GameQuestionOption>), StoreError> {
        let inner = self.inner.lock();
        let mut questions: Vec<GameQuestion> = inner
            .questions
            .iter()
            .filter(|q| q.session_id == session_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.question_order);
        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let options: Vec<GameQuestionOption> = inner
            .options
            .iter()
            .filter(|o| question_ids.contains(&o.question_id))
            .cloned()
            .collect();
        Ok((questions, options))
    }

    async fn find_question_with_options(
        &self,
        question_id: i64,
    ) -> Result<Option<(GameQuestion, Vec<GameQuestionOption>)>, StoreError> {
        let inner = self.inner.lock();
        let Some(question) = inner.questions.iter().find(|q| q.id == question_id) else {
            return Ok(None);
        };
        let options: Vec<GameQuestionOption> = inner
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect();
        Ok(Some((question.clone(), options)))
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<GameAnswer, StoreError> {
        let mut inner = self.inner.lock();
        let duplicate = inner.answers.iter().any(|a| {
            a.question_id == answer.question_id
                && a.session_id == answer.session_id
                && a.user_id == answer.user_id
        });
        if duplicate {
            return Err(StoreError::DuplicateAnswer);
        }
        let id = inner.next_id();
        let stored = GameAnswer {
            id,
            question_id: answer.question_id,
            session_id: answer.session_id,
            user_id: answer.user_id,
            selected_option_id: answer.selected_option_id,
            is_correct: answer.is_correct,
            response_time_ms: answer.response_time_ms,
            answered_at: answer.answered_at,
        };
        inner.answers.push(stored.clone());
        Ok(stored)
    }

    async fn find_answer(
        &self,
        question_id: i64,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<GameAnswer>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .answers
            .iter()
            .find(|a| {
                a.question_id == question_id && a.session_id == session_id && a.user_id == user_id
            })
            .cloned())
    }

    async fn find_answers_by_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Vec<GameAnswer>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .answers
            .iter()
            .filter(|a| a.session_id == session_id && a.user_id == user_id)
            .cloned()
            .collect())
    }
}
