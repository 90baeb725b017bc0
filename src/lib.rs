pub mod auth;
pub mod config;
pub mod db;
pub mod dictionary;
pub mod game;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod workers;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::dictionary::PgWordSource;
use crate::game::{GameService, GameTunables, PgGameStore};
use crate::state::AppState;

pub async fn create_app() -> axum::Router {
    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(_) => None,
    };

    let games = db_proxy.as_ref().map(|proxy| build_game_service(proxy));
    let state = AppState::new(db_proxy, games);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn build_game_service(proxy: &Arc<db::DatabaseProxy>) -> Arc<GameService> {
    let pool = proxy.pool().clone();
    Arc::new(GameService::new(
        Arc::new(PgGameStore::new(pool.clone())),
        Arc::new(PgWordSource::new(pool)),
        GameTunables::from_env(),
    ))
}
