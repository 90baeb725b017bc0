use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder, Row};

use crate::game::model::{
    GameAnswer, GameQuestion, GameQuestionOption, GameSession, NewAnswer, NewOption, NewQuestion,
    NewSession,
};
use crate::game::store::{GameStore, StoreError};

pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = r#"
    id, user_id, mode, source_language_id, target_language_id,
    topic_id, level_id, total_questions, correct_questions, started_at, ended_at
"#;

fn session_from_row(row: &sqlx::postgres::PgRow) -> Result<GameSession, sqlx::Error> {
    Ok(GameSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        mode: row.try_get("mode")?,
        source_language_id: row.try_get("source_language_id")?,
        target_language_id: row.try_get("target_language_id")?,
        topic_id: row.try_get("topic_id")?,
        level_id: row.try_get("level_id")?,
        total_questions: row.try_get("total_questions")?,
        correct_questions: row.try_get("correct_questions")?,
        started_at: row.try_get("started_at")?,
        ended_at: row.try_get("ended_at")?,
    })
}

fn question_from_row(row: &sqlx::postgres::PgRow) -> Result<GameQuestion, sqlx::Error> {
    Ok(GameQuestion {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        question_order: row.try_get("question_order")?,
        question_type: row.try_get("question_type")?,
        source_word_id: row.try_get("source_word_id")?,
        correct_target_word_id: row.try_get("correct_target_word_id")?,
        source_language_id: row.try_get("source_language_id")?,
        target_language_id: row.try_get("target_language_id")?,
        prompt_text: row.try_get("prompt_text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn option_from_row(row: &sqlx::postgres::PgRow) -> Result<GameQuestionOption, sqlx::Error> {
    Ok(GameQuestionOption {
        id: row.try_get("id")?,
        question_id: row.try_get("question_id")?,
        option_label: row.try_get("option_label")?,
        target_word_id: row.try_get("target_word_id")?,
        word_text: row.try_get("word_text")?,
        is_correct: row.try_get("is_correct")?,
    })
}

fn answer_from_row(row: &sqlx::postgres::PgRow) -> Result<GameAnswer, sqlx::Error> {
    Ok(GameAnswer {
        id: row.try_get("id")?,
        question_id: row.try_get("question_id")?,
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        selected_option_id: row.try_get("selected_option_id")?,
        is_correct: row.try_get("is_correct")?,
        response_time_ms: row.try_get("response_time_ms")?,
        answered_at: row.try_get("answered_at")?,
    })
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn insert_session(&self, session: NewSession) -> Result<GameSession, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO game_sessions
              (user_id, mode, source_language_id, target_language_id,
               topic_id, level_id, total_questions, correct_questions, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.user_id)
        .bind(&session.mode)
        .bind(session.source_language_id)
        .bind(session.target_language_id)
        .bind(session.topic_id)
        .bind(session.level_id)
        .bind(session.started_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session_from_row(&row)?)
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<GameSession>, StoreError> {
        let row = sqlx::query(&format!(
            r#"SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = $1"#
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| session_from_row(&row))
            .transpose()
            .map_err(StoreError::Sqlx)
    }

    async fn update_total_questions(&self, session_id: i64, total: i16) -> Result<(), StoreError> {
        sqlx::query("UPDATE game_sessions SET total_questions = $2 WHERE id = $1")
            .bind(session_id)
            .bind(total)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_correct_questions(&self, session_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE game_sessions SET correct_questions = correct_questions + 1 WHERE id = $1",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn end_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<GameSession>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE game_sessions
            SET ended_at = COALESCE(ended_at, $2)
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(ended_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| session_from_row(&row))
            .transpose()
            .map_err(StoreError::Sqlx)
    }

    async fn insert_question_batch(
        &self,
        questions: &[NewQuestion],
        options: &[NewOption],
    ) -> Result<(), StoreError> {
        if questions.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let mut ids_by_order: HashMap<i16, i64> = HashMap::with_capacity(questions.len());
        for question in questions {
            let row = sqlx::query(
                r#"
                INSERT INTO game_questions
                  (session_id, question_order, question_type, source_word_id,
                   correct_target_word_id, source_language_id, target_language_id, prompt_text)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
                "#,
            )
            .bind(question.session_id)
            .bind(question.question_order)
            .bind(&question.question_type)
            .bind(question.source_word_id)
            .bind(question.correct_target_word_id)
            .bind(question.source_language_id)
            .bind(question.target_language_id)
            .bind(&question.prompt_text)
            .fetch_one(&mut *tx)
            .await?;
            let id: i64 = row.try_get("id")?;
            ids_by_order.insert(question.question_order, id);
        }

        if !options.is_empty() {
            let mut qb = QueryBuilder::<sqlx::Postgres>::new(
                "INSERT INTO game_question_options \
                 (question_id, option_label, target_word_id, word_text, is_correct) ",
            );
            qb.push_values(options.iter(), |mut b, option| {
                let question_id = ids_by_order
                    .get(&option.question_order)
                    .copied()
                    .unwrap_or_default();
                b.push_bind(question_id);
                b.push_bind(&option.option_label);
                b.push_bind(option.target_word_id);
                b.push_bind(&option.word_text);
                b.push_bind(option.is_correct);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_questions_by_session(
        &self,
        session_id: i64,
    ) -> Result<(Vec<GameQuestion>, Vec<GameQuestionOption>), StoreError> {
        let question_rows = sqlx::query(
            r#"
            SELECT id, session_id, question_order, question_type, source_word_id,
                   correct_target_word_id, source_language_id, target_language_id,
                   prompt_text, created_at
            FROM game_questions
            WHERE session_id = $1
            ORDER BY question_order
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let questions: Vec<GameQuestion> = question_rows
            .iter()
            .map(question_from_row)
            .collect::<Result<_, _>>()?;

        let option_rows = sqlx::query(
            r#"
            SELECT o.id, o.question_id, o.option_label, o.target_word_id, o.word_text, o.is_correct
            FROM game_question_options o
            INNER JOIN game_questions q ON o.question_id = q.id
            WHERE q.session_id = $1
            ORDER BY q.question_order, o.option_label
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let options: Vec<GameQuestionOption> = option_rows
            .iter()
            .map(option_from_row)
            .collect::<Result<_, _>>()?;

        Ok((questions, options))
    }

    async fn find_question_with_options(
        &self,
        question_id: i64,
    ) -> Result<Option<(GameQuestion, Vec<GameQuestionOption>)>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, session_id, question_order, question_type, source_word_id,
                   correct_target_word_id, source_language_id, target_language_id,
                   prompt_text, created_at
            FROM game_questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let question = question_from_row(&row)?;

        let option_rows = sqlx::query(
            r#"
            SELECT id, question_id, option_label, target_word_id, word_text, is_correct
            FROM game_question_options
            WHERE question_id = $1
            ORDER BY option_label
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        let options: Vec<GameQuestionOption> = option_rows
            .iter()
            .map(option_from_row)
            .collect::<Result<_, _>>()?;

        Ok(Some((question, options)))
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<GameAnswer, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO game_answers
              (question_id, session_id, user_id, selected_option_id,
               is_correct, response_time_ms, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, question_id, session_id, user_id, selected_option_id,
                      is_correct, response_time_ms, answered_at
            "#,
        )
        .bind(answer.question_id)
        .bind(answer.session_id)
        .bind(answer.user_id)
        .bind(answer.selected_option_id)
        .bind(answer.is_correct)
        .bind(answer.response_time_ms)
        .bind(answer.answered_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(answer_from_row(&row)?),
            Err(err) => {
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    return Err(StoreError::DuplicateAnswer);
                }
                Err(StoreError::Sqlx(err))
            }
        }
    }

    async fn find_answer(
        &self,
        question_id: i64,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<GameAnswer>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, question_id, session_id, user_id, selected_option_id,
                   is_correct, response_time_ms, answered_at
            FROM game_answers
            WHERE question_id = $1 AND session_id = $2 AND user_id = $3
            "#,
        )
        .bind(question_id)
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| answer_from_row(&row))
            .transpose()
            .map_err(StoreError::Sqlx)
    }

    async fn find_answers_by_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Vec<GameAnswer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, question_id, session_id, user_id, selected_option_id,
                   is_correct, response_time_ms, answered_at
            FROM game_answers
            WHERE session_id = $1 AND user_id = $2
            ORDER BY answered_at, id
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| answer_from_row(row).map_err(StoreError::Sqlx))
            .collect()
    }
}
