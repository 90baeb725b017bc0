use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;
use tracing::info;

use crate::db::DatabaseProxy;

/// How far back the sweep looks for sessions worth checking.
const LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Default)]
struct ReconcileStats {
    totals_fixed: u64,
    corrects_fixed: u64,
    duration_secs: f64,
}

/// Heals the denormalized counters on recent sessions. The question and
/// answer rows are the source of truth; the session row caches their
/// counts and can drift when a best-effort update is lost.
pub async fn reconcile_session_counters(db: Arc<DatabaseProxy>) -> Result<(), super::WorkerError> {
    let start = Instant::now();
    info!("Starting session counter reconciliation");

    let pool = db.pool();
    let mut stats = ReconcileStats::default();

    stats.totals_fixed = fix_total_questions(pool).await?;
    stats.corrects_fixed = fix_correct_questions(pool).await?;
    stats.duration_secs = start.elapsed().as_secs_f64();

    info!(
        totals_fixed = stats.totals_fixed,
        corrects_fixed = stats.corrects_fixed,
        duration_secs = format!("{:.2}", stats.duration_secs),
        "Session counter reconciliation completed"
    );

    Ok(())
}

async fn fix_total_questions(pool: &PgPool) -> Result<u64, super::WorkerError> {
    let result = sqlx::query(
        r#"
        UPDATE game_sessions s
        SET total_questions = q.actual
        FROM (
            SELECT session_id, COUNT(*)::smallint AS actual
            FROM game_questions
            GROUP BY session_id
        ) q
        WHERE s.id = q.session_id
          AND s.total_questions <> q.actual
          AND s.started_at > NOW() - make_interval(hours => $1)
        "#,
    )
    .bind(LOOKBACK_HOURS)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

async fn fix_correct_questions(pool: &PgPool) -> Result<u64, super::WorkerError> {
    let result = sqlx::query(
        r#"
        UPDATE game_sessions s
        SET correct_questions = a.actual
        FROM (
            SELECT session_id, COUNT(*) FILTER (WHERE is_correct)::smallint AS actual
            FROM game_answers
            GROUP BY session_id
        ) a
        WHERE s.id = a.session_id
          AND s.correct_questions <> a.actual
          AND s.started_at > NOW() - make_interval(hours => $1)
        "#,
    )
    .bind(LOOKBACK_HOURS)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
