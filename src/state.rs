use std::sync::Arc;
use std::time::{Instant, SystemTime};

use axum::http::StatusCode;

use crate::db::DatabaseProxy;
use crate::game::GameService;
use crate::response::{json_error, AppError};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Option<Arc<DatabaseProxy>>,
    games: Option<Arc<GameService>>,
}

impl AppState {
    pub fn new(db_proxy: Option<Arc<DatabaseProxy>>, games: Option<Arc<GameService>>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            games,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    /// The game service, or a 503 when the database never came up.
    pub fn games(&self) -> Result<Arc<GameService>, AppError> {
        self.games.clone().ok_or_else(|| {
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Dịch vụ cơ sở dữ liệu không khả dụng",
            )
        })
    }
}
