use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::AppError;
use crate::routes::games::parse_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sessions/:sessionId", get(session_statistics))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

async fn session_statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let games = state.games()?;

    let stats = games.session_statistics(session_id, user.id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        data: stats,
    }))
}
