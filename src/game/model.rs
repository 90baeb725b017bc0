use chrono::{DateTime, Utc};
use serde::Serialize;

/// The only play mode currently supported.
pub const MODE_LEVEL: &str = "level";

/// One play-through of the vocabulary game for a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: i64,
    pub user_id: i64,
    pub mode: String,
    pub source_language_id: i16,
    pub target_language_id: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_id: Option<i64>,
    pub total_questions: i16,
    pub correct_questions: i16,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Session fields known before the row exists. The schema keeps a single
/// `topic_id` column, so only the first requested topic is persisted here.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub mode: String,
    pub source_language_id: i16,
    pub target_language_id: i16,
    pub topic_id: Option<i64>,
    pub level_id: Option<i64>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuestion {
    pub id: i64,
    pub session_id: i64,
    pub question_order: i16,
    pub question_type: String,
    pub source_word_id: i64,
    pub correct_target_word_id: i64,
    pub source_language_id: i16,
    pub target_language_id: i16,
    pub prompt_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GameQuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub option_label: String,
    pub target_word_id: i64,
    pub word_text: String,
    pub is_correct: bool,
}

/// A question produced by the generator, before persistence assigns ids.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub session_id: i64,
    pub question_order: i16,
    pub question_type: String,
    pub source_word_id: i64,
    pub correct_target_word_id: i64,
    pub source_language_id: i16,
    pub target_language_id: i16,
    pub prompt_text: String,
}

/// A generated option. Linked to its question by `question_order` because
/// question ids do not exist until the batch is written.
#[derive(Debug, Clone)]
pub struct NewOption {
    pub question_order: i16,
    pub option_label: String,
    pub target_word_id: i64,
    pub word_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnswer {
    pub id: i64,
    pub question_id: i64,
    pub session_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i32>,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: i64,
    pub session_id: i64,
    pub user_id: i64,
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    pub response_time_ms: Option<i32>,
    pub answered_at: DateTime<Utc>,
}

/// Read-only projection over a session's answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub session_id: i64,
    pub total_questions: i16,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub accuracy_percentage: f64,
    pub duration_seconds: i64,
    pub average_response_time_ms: f64,
}
