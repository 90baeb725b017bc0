mod games;
mod health;
mod statistics;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::middleware::require_auth;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let authed = Router::new()
        .nest("/api/v1/games", games::router())
        .nest("/api/v1/statistics", statistics::router())
        .layer(middleware::from_fn(require_auth));

    Router::new()
        .merge(authed)
        .nest("/health", health::router())
        .nest("/api/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "Không tìm thấy tài nguyên",
    )
    .into_response()
}
