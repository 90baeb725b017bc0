use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::dictionary::WordSource;
use crate::game::error::GameError;
use crate::game::generator::{
    self, GenerationParams, GeneratorError, DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT,
    MIN_QUESTION_COUNT,
};
use crate::game::model::{
    GameAnswer, GameQuestion, GameQuestionOption, GameSession, NewAnswer, NewSession,
    SessionStatistics, MODE_LEVEL,
};
use crate::game::store::GameStore;

#[derive(Debug, Clone)]
pub struct GameTunables {
    /// Questions to aim for per session, clamped to the fixed 1..=20 range.
    pub question_count: usize,
    pub generation_timeout: Duration,
}

impl GameTunables {
    pub fn from_env() -> Self {
        let question_count = std::env::var("GAME_DEFAULT_QUESTION_COUNT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(DEFAULT_QUESTION_COUNT)
            .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
        let timeout_ms = std::env::var("GAME_GENERATION_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(1000);

        Self {
            question_count,
            generation_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl Default for GameTunables {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            generation_timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub source_language_id: i16,
    pub target_language_id: i16,
    pub mode: String,
    pub level_id: Option<i64>,
    pub topic_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct SubmitAnswerInput {
    pub question_id: i64,
    pub selected_option_id: i64,
    pub response_time_ms: Option<i32>,
}

/// Orchestrates the game-session lifecycle over injected collaborators.
pub struct GameService {
    store: Arc<dyn GameStore>,
    words: Arc<dyn WordSource>,
    tunables: GameTunables,
}

impl GameService {
    pub fn new(
        store: Arc<dyn GameStore>,
        words: Arc<dyn WordSource>,
        tunables: GameTunables,
    ) -> Self {
        Self {
            store,
            words,
            tunables,
        }
    }

    /// Creates a session and generates its question set upfront.
    ///
    /// The empty session row is persisted before generation because questions
    /// reference the session id. On insufficient vocabulary the empty row is
    /// intentionally left in place. The final question-count update is
    /// best-effort: the question rows are authoritative.
    pub async fn create_session(
        &self,
        input: CreateSessionInput,
        user_id: i64,
    ) -> Result<GameSession, GameError> {
        let level_id = validate_create_input(&input)?;

        let mut session = self
            .store
            .insert_session(NewSession {
                user_id,
                mode: input.mode.clone(),
                source_language_id: input.source_language_id,
                target_language_id: input.target_language_id,
                // The schema keeps a single topic column; filtering still
                // considers every requested topic.
                topic_id: input.topic_ids.first().copied(),
                level_id: Some(level_id),
                started_at: Utc::now(),
            })
            .await?;

        let params = GenerationParams {
            session_id: session.id,
            source_language_id: input.source_language_id,
            target_language_id: input.target_language_id,
            topic_ids: input.topic_ids.clone(),
            level_id,
            max_count: self.tunables.question_count,
        };

        let generated = tokio::time::timeout(
            self.tunables.generation_timeout,
            generator::generate_questions(self.words.as_ref(), &params),
        )
        .await;

        let (questions, options) = match generated {
            Ok(Ok(pair)) => pair,
            Ok(Err(GeneratorError::InsufficientCandidates { required, available })) => {
                info!(
                    session_id = session.id,
                    user_id,
                    required,
                    available,
                    "not enough candidate words for session"
                );
                return Err(GameError::InsufficientWords);
            }
            Ok(Err(GeneratorError::Source(err))) => {
                tracing::error!(
                    session_id = session.id,
                    user_id,
                    error = %err,
                    "question generation failed"
                );
                return Err(GameError::Generation(err));
            }
            Err(_) => {
                tracing::error!(session_id = session.id, user_id, "question generation timed out");
                return Err(GameError::Timeout);
            }
        };

        if questions.len() < MIN_QUESTION_COUNT {
            return Err(GameError::InsufficientWords);
        }

        self.store.insert_question_batch(&questions, &options).await?;

        let total = questions.len() as i16;
        if let Err(err) = self.store.update_total_questions(session.id, total).await {
            // The questions are already durable; the counter is healed by the
            // reconciliation sweep.
            warn!(
                session_id = session.id,
                error = %err,
                "failed to update session question count"
            );
        }
        session.total_questions = total;

        info!(
            session_id = session.id,
            user_id,
            mode = %session.mode,
            source_language_id = session.source_language_id,
            target_language_id = session.target_language_id,
            question_count = questions.len(),
            "game session created with questions"
        );

        Ok(session)
    }

    pub async fn get_session_with_questions(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<(GameSession, Vec<GameQuestion>, Vec<GameQuestionOption>), GameError> {
        let session = self.owned_session(session_id, user_id).await?;
        let (questions, options) = self.store.find_questions_by_session(session_id).await?;
        Ok((session, questions, options))
    }

    /// Evaluates one answer. At most one answer is accepted per
    /// (question, session, user); the pre-check fails fast and the storage
    /// uniqueness constraint decides races.
    pub async fn submit_answer(
        &self,
        session_id: i64,
        user_id: i64,
        input: SubmitAnswerInput,
    ) -> Result<GameAnswer, GameError> {
        if input.response_time_ms.is_some_and(|ms| ms <= 0) {
            return Err(GameError::Validation {
                field: "responseTimeMs",
                rule: "responseTimeMs phải lớn hơn 0".to_string(),
            });
        }

        let Some((question, options)) =
            self.store.find_question_with_options(input.question_id).await?
        else {
            return Err(GameError::QuestionNotFound {
                question_id: input.question_id,
            });
        };

        if question.session_id != session_id {
            return Err(GameError::QuestionNotInSession {
                question_id: question.id,
                session_id,
            });
        }

        let Some(selected) = options.iter().find(|o| o.id == input.selected_option_id) else {
            return Err(GameError::OptionNotFound {
                option_id: input.selected_option_id,
                question_id: question.id,
            });
        };
        let is_correct = selected.is_correct;

        if self
            .store
            .find_answer(question.id, session_id, user_id)
            .await?
            .is_some()
        {
            return Err(GameError::AnswerAlreadySubmitted {
                question_id: question.id,
            });
        }

        let answer = self
            .store
            .insert_answer(NewAnswer {
                question_id: question.id,
                session_id,
                user_id,
                selected_option_id: Some(selected.id),
                is_correct,
                response_time_ms: input.response_time_ms,
                answered_at: Utc::now(),
            })
            .await
            .map_err(|err| GameError::from_store(err, question.id))?;

        if is_correct {
            if let Err(err) = self.store.increment_correct_questions(session_id).await {
                // Answer rows stay authoritative; see the reconciliation sweep.
                warn!(
                    session_id,
                    question_id = question.id,
                    error = %err,
                    "failed to update session correct count"
                );
            }
        }

        info!(
            answer_id = answer.id,
            question_id = question.id,
            session_id,
            user_id,
            is_correct,
            "answer submitted"
        );

        Ok(answer)
    }

    /// Marks the session ended. Idempotent; the first end timestamp wins.
    pub async fn end_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<GameSession, GameError> {
        self.owned_session(session_id, user_id).await?;
        let ended = self.store.end_session(session_id, Utc::now()).await?;
        ended.ok_or(GameError::SessionNotFound { session_id })
    }

    /// Read-only summary over the session's answers.
    pub async fn session_statistics(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<SessionStatistics, GameError> {
        let session = self.owned_session(session_id, user_id).await?;
        let answers = self.store.find_answers_by_session(session_id, user_id).await?;
        Ok(project_statistics(&session, &answers))
    }

    async fn owned_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<GameSession, GameError> {
        let Some(session) = self.store.find_session(session_id).await? else {
            return Err(GameError::SessionNotFound { session_id });
        };
        if session.user_id != user_id {
            return Err(GameError::Forbidden { session_id });
        }
        Ok(session)
    }
}

fn validate_create_input(input: &CreateSessionInput) -> Result<i64, GameError> {
    if input.source_language_id == input.target_language_id {
        return Err(GameError::Validation {
            field: "targetLanguageId",
            rule: "Ngôn ngữ nguồn và ngôn ngữ đích phải khác nhau".to_string(),
        });
    }
    if input.mode != MODE_LEVEL {
        return Err(GameError::Validation {
            field: "mode",
            rule: "Chế độ phải là 'level'".to_string(),
        });
    }
    let level_id = match input.level_id {
        Some(id) if id > 0 => id,
        _ => {
            return Err(GameError::Validation {
                field: "levelId",
                rule: "levelId là bắt buộc và phải lớn hơn 0".to_string(),
            })
        }
    };
    if input.topic_ids.iter().any(|id| *id <= 0) {
        return Err(GameError::Validation {
            field: "topicIds",
            rule: "Tất cả topicIds phải lớn hơn 0".to_string(),
        });
    }
    Ok(level_id)
}

fn project_statistics(session: &GameSession, answers: &[GameAnswer]) -> SessionStatistics {
    let correct_answers = answers.iter().filter(|a| a.is_correct).count() as i64;
    let wrong_answers = answers.len() as i64 - correct_answers;

    let accuracy_percentage = if session.total_questions > 0 {
        correct_answers as f64 / session.total_questions as f64 * 100.0
    } else {
        0.0
    };

    let ended = session.ended_at.unwrap_or_else(Utc::now);
    let duration_seconds = (ended - session.started_at).num_seconds().max(0);

    let timed: Vec<i32> = answers.iter().filter_map(|a| a.response_time_ms).collect();
    let average_response_time_ms = if timed.is_empty() {
        0.0
    } else {
        timed.iter().map(|ms| *ms as f64).sum::<f64>() / timed.len() as f64
    };

    SessionStatistics {
        session_id: session.id,
        total_questions: session.total_questions,
        correct_answers,
        wrong_answers,
        accuracy_percentage,
        duration_seconds,
        average_response_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn base_input() -> CreateSessionInput {
        CreateSessionInput {
            source_language_id: 1,
            target_language_id: 2,
            mode: MODE_LEVEL.to_string(),
            level_id: Some(3),
            topic_ids: vec![],
        }
    }

    #[test]
    fn valid_input_passes() {
        assert_eq!(validate_create_input(&base_input()).unwrap(), 3);
    }

    #[test]
    fn same_language_pair_is_rejected() {
        let mut input = base_input();
        input.target_language_id = 1;
        let err = validate_create_input(&input).unwrap_err();
        assert!(matches!(
            err,
            GameError::Validation {
                field: "targetLanguageId",
                ..
            }
        ));
    }

    #[test]
    fn unsupported_mode_is_rejected() {
        let mut input = base_input();
        input.mode = "topic".to_string();
        let err = validate_create_input(&input).unwrap_err();
        assert!(matches!(err, GameError::Validation { field: "mode", .. }));
    }

    #[test]
    fn missing_or_nonpositive_level_is_rejected() {
        let mut input = base_input();
        input.level_id = None;
        assert!(matches!(
            validate_create_input(&input).unwrap_err(),
            GameError::Validation { field: "levelId", .. }
        ));
        input.level_id = Some(0);
        assert!(matches!(
            validate_create_input(&input).unwrap_err(),
            GameError::Validation { field: "levelId", .. }
        ));
    }

    #[test]
    fn nonpositive_topic_id_is_rejected() {
        let mut input = base_input();
        input.topic_ids = vec![4, -1];
        assert!(matches!(
            validate_create_input(&input).unwrap_err(),
            GameError::Validation { field: "topicIds", .. }
        ));
    }

    fn session(total: i16) -> GameSession {
        let started_at = Utc::now() - ChronoDuration::seconds(90);
        GameSession {
            id: 1,
            user_id: 7,
            mode: MODE_LEVEL.to_string(),
            source_language_id: 1,
            target_language_id: 2,
            topic_id: None,
            level_id: Some(3),
            total_questions: total,
            correct_questions: 0,
            started_at,
            ended_at: Some(started_at + ChronoDuration::seconds(60)),
        }
    }

    fn answer(id: i64, is_correct: bool, response_time_ms: Option<i32>) -> GameAnswer {
        GameAnswer {
            id,
            question_id: id,
            session_id: 1,
            user_id: 7,
            selected_option_id: Some(id * 10),
            is_correct,
            response_time_ms,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn statistics_three_of_five_is_sixty_percent() {
        let answers = vec![
            answer(1, true, Some(1000)),
            answer(2, true, Some(2000)),
            answer(3, true, None),
            answer(4, false, Some(3000)),
            answer(5, false, None),
        ];
        let stats = project_statistics(&session(5), &answers);
        assert_eq!(stats.correct_answers, 3);
        assert_eq!(stats.wrong_answers, 2);
        assert!((stats.accuracy_percentage - 60.0).abs() < f64::EPSILON);
        assert_eq!(stats.duration_seconds, 60);
        assert!((stats.average_response_time_ms - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_with_no_questions_has_zero_accuracy() {
        let stats = project_statistics(&session(0), &[]);
        assert_eq!(stats.accuracy_percentage, 0.0);
        assert_eq!(stats.average_response_time_ms, 0.0);
    }
}
