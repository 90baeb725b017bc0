use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::ProbeStatus;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

async fn root(State(state): State<AppState>) -> Response {
    let db_status = database_check(&state).await;
    let ok = matches!(db_status, DbCheckStatus::Connected { .. });

    let response = CompatHealthResponse {
        database: if ok { "connected" } else { "disconnected" },
        timestamp: now_iso(),
        status: if ok { "ok" } else { "degraded" },
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let response = LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        version: app_version(),
    };

    Json(response).into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let db_check = database_check(&state).await;

    let (database_status, database_latency_ms) = match db_check {
        DbCheckStatus::Connected { latency_ms } => ("connected", Some(latency_ms)),
        DbCheckStatus::Timeout => ("timeout", None),
        DbCheckStatus::Disconnected => ("disconnected", None),
    };

    let status = match database_status {
        "connected" => "healthy",
        "timeout" => "degraded",
        _ => "unhealthy",
    };

    let response = ReadinessResponse {
        status,
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        version: app_version(),
        checks: ReadinessChecks {
            database: database_status,
        },
        details: database_latency_ms.map(|latency| ReadinessDetails {
            database_latency: Some(latency),
        }),
    };

    let status_code = match status {
        "healthy" | "degraded" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response)).into_response()
}

#[derive(Debug)]
enum DbCheckStatus {
    Connected { latency_ms: u64 },
    Timeout,
    Disconnected,
}

async fn database_check(state: &AppState) -> DbCheckStatus {
    let Some(proxy) = state.db_proxy() else {
        return DbCheckStatus::Disconnected;
    };

    match proxy.probe().await {
        ProbeStatus::Connected { latency_ms } => DbCheckStatus::Connected { latency_ms },
        ProbeStatus::Timeout => DbCheckStatus::Timeout,
        ProbeStatus::Disconnected { .. } => DbCheckStatus::Disconnected,
    }
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn app_version() -> String {
    std::env::var("APP_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

#[derive(Serialize)]
struct CompatHealthResponse {
    database: &'static str,
    timestamp: String,
    status: &'static str,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    version: String,
    checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ReadinessDetails>,
}

#[derive(Serialize)]
struct ReadinessChecks {
    database: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency: Option<u64>,
}
