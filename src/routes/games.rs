use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::game::model::{GameQuestion, GameQuestionOption, GameSession};
use crate::game::{CreateSessionInput, SubmitAnswerInput};
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:sessionId", get(get_session))
        .route("/sessions/:sessionId/answers", post(submit_answer))
        .route("/sessions/:sessionId/end", post(end_session))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateSessionRequest {
    source_language_id: i16,
    target_language_id: i16,
    mode: String,
    level_id: Option<i64>,
    #[serde(default)]
    topic_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubmitAnswerRequest {
    question_id: i64,
    selected_option_id: i64,
    response_time_ms: Option<i32>,
}

/// Option as shown to the player. Correctness is withheld until the
/// answer is submitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionView {
    id: i64,
    option_label: String,
    word_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionView {
    id: i64,
    question_order: i16,
    question_type: String,
    prompt_text: String,
    options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionWithQuestionsView {
    #[serde(flatten)]
    session: GameSession,
    questions: Vec<QuestionView>,
}

pub(super) async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(bad_request_body)?;
    let games = state.games()?;

    let session = games
        .create_session(
            CreateSessionInput {
                source_language_id: payload.source_language_id,
                target_language_id: payload.target_language_id,
                mode: payload.mode,
                level_id: payload.level_id,
                topic_ids: payload.topic_ids,
            },
            user.id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: session,
        }),
    ))
}

pub(super) async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let games = state.games()?;

    let (session, questions, options) = games
        .get_session_with_questions(session_id, user.id)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        data: SessionWithQuestionsView {
            session,
            questions: assemble_questions(questions, options),
        },
    }))
}

pub(super) async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let Json(payload) = payload.map_err(bad_request_body)?;
    let games = state.games()?;

    let answer = games
        .submit_answer(
            session_id,
            user.id,
            SubmitAnswerInput {
                question_id: payload.question_id,
                selected_option_id: payload.selected_option_id,
                response_time_ms: payload.response_time_ms,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: answer,
        }),
    ))
}

pub(super) async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let games = state.games()?;

    let session = games.end_session(session_id, user.id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        data: session,
    }))
}

pub(super) fn parse_session_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().ok().filter(|id| *id > 0).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "ID phiên chơi không hợp lệ",
        )
    })
}

fn bad_request_body(_: JsonRejection) -> AppError {
    json_error(
        StatusCode::BAD_REQUEST,
        "INVALID_REQUEST",
        "Dữ liệu yêu cầu không hợp lệ",
    )
}

fn assemble_questions(
    questions: Vec<GameQuestion>,
    options: Vec<GameQuestionOption>,
) -> Vec<QuestionView> {
    questions
        .into_iter()
        .map(|question| {
            let views = options
                .iter()
                .filter(|option| option.question_id == question.id)
                .map(|option| OptionView {
                    id: option.id,
                    option_label: option.option_label.clone(),
                    word_text: option.word_text.clone(),
                })
                .collect();
            QuestionView {
                id: question.id,
                question_order: question.question_order,
                question_type: question.question_type,
                prompt_text: question.prompt_text,
                options: views,
            }
        })
        .collect()
}
