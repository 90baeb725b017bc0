#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tuvung_backend_rust::dictionary::{MemoryWordSource, Word};
use tuvung_backend_rust::game::{GameService, GameTunables, MemoryGameStore};
use tuvung_backend_rust::routes;
use tuvung_backend_rust::state::AppState;

pub const TEST_USER_ID: i64 = 7;
pub const OTHER_USER_ID: i64 = 8;

pub const SOURCE_LANGUAGE: i16 = 1;
pub const TARGET_LANGUAGE: i16 = 2;
pub const LEVEL_ID: i64 = 3;

/// App without a database: health degrades and game routes answer 503.
pub async fn create_test_app() -> Router {
    std::env::set_var("JWT_SECRET", "test-secret");

    let state = AppState::new(None, None);
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// App over the in-memory store and a seeded word pool.
pub async fn create_game_test_app(pool_size: i64) -> Router {
    std::env::set_var("JWT_SECRET", "test-secret");

    let words = Arc::new(MemoryWordSource::new());
    seed_word_pool(&words, pool_size);

    let service = GameService::new(
        Arc::new(MemoryGameStore::new()),
        words,
        GameTunables {
            question_count: 5,
            generation_timeout: Duration::from_millis(1000),
        },
    );

    let state = AppState::new(None, Some(Arc::new(service)));
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn build_game_service(pool_size: i64, question_count: usize) -> GameService {
    let words = Arc::new(MemoryWordSource::new());
    seed_word_pool(&words, pool_size);

    GameService::new(
        Arc::new(MemoryGameStore::new()),
        words,
        GameTunables {
            question_count,
            generation_timeout: Duration::from_millis(1000),
        },
    )
}

/// Seeds `pool_size` source words at [`LEVEL_ID`], each with one translation
/// into the target language.
pub fn seed_word_pool(words: &MemoryWordSource, pool_size: i64) {
    for i in 0..pool_size {
        let source_id = 100 + i;
        let target_id = 1000 + i;
        words.add_word(
            Word {
                id: source_id,
                language_id: SOURCE_LANGUAGE,
                lemma: format!("source-{i}"),
                part_of_speech_id: None,
                frequency_rank: Some(i as i32 + 1),
            },
            &[LEVEL_ID],
            &[],
        );
        words.add_word(
            Word {
                id: target_id,
                language_id: TARGET_LANGUAGE,
                lemma: format!("target-{i}"),
                part_of_speech_id: None,
                frequency_rank: Some(i as i32 + 1),
            },
            &[],
            &[],
        );
        words.add_translation(source_id, target_id, 1);
    }
}

pub fn auth_header(user_id: i64) -> String {
    std::env::set_var("JWT_SECRET", "test-secret");
    let token = tuvung_backend_rust::auth::sign_jwt_for_user(user_id).expect("sign test token");
    format!("Bearer {token}")
}
