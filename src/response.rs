use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::game::GameError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "Lỗi máy chủ nội bộ".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError::operational(status, code, message)
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Validation { rule, .. } => {
                json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", rule)
            }
            GameError::InsufficientWords => json_error(
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_WORDS",
                "Không đủ từ vựng để tạo phiên chơi. Vui lòng chọn chủ đề hoặc cấp độ khác",
            ),
            GameError::SessionNotFound { .. } => json_error(
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Không tìm thấy phiên chơi",
            ),
            GameError::QuestionNotFound { .. } => json_error(
                StatusCode::NOT_FOUND,
                "QUESTION_NOT_FOUND",
                "Không tìm thấy câu hỏi",
            ),
            GameError::QuestionNotInSession { .. } => json_error(
                StatusCode::NOT_FOUND,
                "QUESTION_NOT_IN_SESSION",
                "Câu hỏi không thuộc phiên chơi này",
            ),
            GameError::OptionNotFound { .. } => json_error(
                StatusCode::NOT_FOUND,
                "OPTION_NOT_FOUND",
                "Không tìm thấy lựa chọn",
            ),
            GameError::AnswerAlreadySubmitted { .. } => json_error(
                StatusCode::CONFLICT,
                "ANSWER_ALREADY_SUBMITTED",
                "Câu hỏi này đã được trả lời",
            ),
            GameError::Forbidden { .. } => json_error(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Bạn không có quyền truy cập phiên chơi này",
            ),
            GameError::Timeout => json_error(
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "Tạo câu hỏi quá thời gian cho phép",
            ),
            GameError::Generation(err) => AppError::internal(err.to_string()),
            GameError::Storage(err) => AppError::internal(err.to_string()),
        }
    }
}
